//! Integration tests: ConnectivityManager → state machine → link driver,
//! with a scripted mock link and a recording event sink.

#![cfg(not(target_os = "espidf"))]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use skynode::config::{SystemConfig, WifiCredentials};
use skynode::net::{
    ConnectionState, ConnectivityManager, LinkEvent, LinkEventSink, LinkPort, LinkStatus,
};

// ── Mock implementations ──────────────────────────────────────

struct LinkInner {
    status: LinkStatus,
    attempts: u32,
    disassociations: u32,
    /// When set, an association attempt immediately yields this status.
    on_associate: Option<LinkStatus>,
}

/// Scripted radio link. The test keeps a [`LinkProbe`] clone to steer the
/// reported status and observe association attempts from outside.
struct MockLink {
    inner: Arc<Mutex<LinkInner>>,
}

#[derive(Clone)]
struct LinkProbe {
    inner: Arc<Mutex<LinkInner>>,
}

fn mock_link(on_associate: Option<LinkStatus>) -> (MockLink, LinkProbe) {
    let inner = Arc::new(Mutex::new(LinkInner {
        status: LinkStatus::Disconnected,
        attempts: 0,
        disassociations: 0,
        on_associate,
    }));
    (
        MockLink {
            inner: Arc::clone(&inner),
        },
        LinkProbe { inner },
    )
}

impl LinkProbe {
    fn set_status(&self, status: LinkStatus) {
        self.inner.lock().unwrap().status = status;
    }

    fn attempts(&self) -> u32 {
        self.inner.lock().unwrap().attempts
    }

    fn disassociations(&self) -> u32 {
        self.inner.lock().unwrap().disassociations
    }
}

impl LinkPort for MockLink {
    fn associate(&mut self, _credentials: &WifiCredentials) -> Result<(), skynode::error::LinkError> {
        let mut inner = self.inner.lock().unwrap();
        inner.attempts += 1;
        if let Some(next) = inner.on_associate {
            inner.status = next;
        }
        Ok(())
    }

    fn disassociate(&mut self) {
        let mut inner = self.inner.lock().unwrap();
        inner.disassociations += 1;
        inner.status = LinkStatus::Disconnected;
    }

    fn status(&mut self) -> LinkStatus {
        self.inner.lock().unwrap().status
    }
}

/// Sink that records every notification for later inspection.
#[derive(Clone, Default)]
struct RecordingSink {
    events: Arc<Mutex<Vec<LinkEvent>>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<LinkEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl LinkEventSink for RecordingSink {
    fn emit(&mut self, event: LinkEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ── Helpers ───────────────────────────────────────────────────

fn fast_config() -> SystemConfig {
    SystemConfig {
        link_poll_interval_ms: 5,
        link_retry_delay_ms: 25,
        stop_grace_ms: 500,
        ..SystemConfig::default()
    }
}

fn creds() -> WifiCredentials {
    WifiCredentials::new("TestNet", "password123").unwrap()
}

fn wait_for_state<L, S>(mgr: &ConnectivityManager<L, S>, want: ConnectionState)
where
    L: LinkPort + 'static,
    S: LinkEventSink + 'static,
{
    let begun = Instant::now();
    while mgr.state() != want {
        assert!(
            begun.elapsed() < Duration::from_secs(2),
            "state never became {want:?} (currently {:?})",
            mgr.state()
        );
        std::thread::sleep(Duration::from_millis(2));
    }
}

// ── Scenarios ─────────────────────────────────────────────────

/// Valid credentials → start → connect → the first poll reports
/// connected → state is Connected and exactly one "connected"
/// notification was emitted.
#[test]
fn connect_then_connected_poll_emits_exactly_one_notification() {
    let (link, probe) = mock_link(Some(LinkStatus::Connected));
    let sink = RecordingSink::default();
    let mut mgr = ConnectivityManager::new(creds(), link, sink.clone(), &fast_config());

    assert_eq!(mgr.state(), ConnectionState::Disconnected);
    mgr.start().unwrap();
    mgr.connect();
    wait_for_state(&mgr, ConnectionState::Connected);

    // Let several more polls happen: still exactly one notification.
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(sink.events(), vec![LinkEvent::Connected]);
    assert_eq!(probe.attempts(), 1, "no reassociation while connected");
    mgr.stop();
}

#[test]
fn connect_transitions_through_connecting() {
    let (link, _probe) = mock_link(Some(LinkStatus::Searching));
    let mut mgr = ConnectivityManager::new(creds(), link, RecordingSink::default(), &fast_config());
    mgr.start().unwrap();
    mgr.connect();
    wait_for_state(&mgr, ConnectionState::Connecting);
    mgr.stop();
}

/// While the link stays down, reassociations fire on the retry cadence:
/// one per retry delay, never a burst.
#[test]
fn retry_fires_once_per_delay_while_down() {
    let (link, probe) = mock_link(None); // attempts never change the status
    let mut mgr = ConnectivityManager::new(creds(), link, RecordingSink::default(), &fast_config());
    mgr.start().unwrap();

    // ~8 retry windows of 25 ms. Generous bounds absorb scheduling
    // jitter; what matters is "roughly one per window, not zero, not a
    // burst per poll" (polls are 5x more frequent than retries).
    std::thread::sleep(Duration::from_millis(200));
    mgr.stop();

    let attempts = probe.attempts();
    assert!(
        (4..=12).contains(&attempts),
        "expected ~8 retry attempts, got {attempts}"
    );
}

#[test]
fn lost_link_notifies_and_recovers() {
    let (link, probe) = mock_link(Some(LinkStatus::Connected));
    let sink = RecordingSink::default();
    let mut mgr = ConnectivityManager::new(creds(), link, sink.clone(), &fast_config());
    mgr.start().unwrap();
    mgr.connect();
    wait_for_state(&mgr, ConnectionState::Connected);

    // Drop the link out from under the manager. The retry path must
    // reassociate (which the mock scripts back to Connected).
    probe.set_status(LinkStatus::Disconnected);
    wait_for_state(&mgr, ConnectionState::Disconnected);
    wait_for_state(&mgr, ConnectionState::Connected);
    mgr.stop();

    let events = sink.events();
    assert_eq!(
        events,
        vec![
            LinkEvent::Connected,
            LinkEvent::Disconnected,
            LinkEvent::Connected,
        ]
    );
}

#[test]
fn disconnect_command_tears_down_and_publishes_disconnected() {
    let (link, probe) = mock_link(Some(LinkStatus::Connected));
    let mut mgr = ConnectivityManager::new(creds(), link, RecordingSink::default(), &fast_config());
    mgr.start().unwrap();
    mgr.connect();
    wait_for_state(&mgr, ConnectionState::Connected);

    mgr.disconnect();
    wait_for_state(&mgr, ConnectionState::Disconnected);
    assert!(probe.disassociations() >= 1);
    mgr.stop();
}

/// stop() → start() reinitializes to Disconnected before any poll, and
/// the task disassociates on its way out.
#[test]
fn stop_then_start_returns_to_disconnected() {
    let (link, probe) = mock_link(Some(LinkStatus::Connected));
    let mut mgr = ConnectivityManager::new(creds(), link, RecordingSink::default(), &fast_config());
    mgr.start().unwrap();
    mgr.connect();
    wait_for_state(&mgr, ConnectionState::Connected);

    mgr.stop();
    assert!(!mgr.is_running());
    assert_eq!(mgr.state(), ConnectionState::Disconnected);
    assert!(probe.disassociations() >= 1, "exit path must disassociate");

    mgr.start().unwrap();
    assert_eq!(mgr.state(), ConnectionState::Disconnected);
    mgr.stop();
}
