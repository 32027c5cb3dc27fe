//! Connection state machine.
//!
//! Pure logic, no I/O: the management task feeds it the polled link
//! status plus the current monotonic time, and it answers with the
//! transition's side effects. Keeping it free of driver calls makes the
//! transition table and the retry cadence exhaustively unit-testable.
//!
//! ## Retry path
//!
//! There is exactly one. Entering (or sitting in) Failed or Disconnected
//! arms a due-time; each poll at or past the due-time yields one
//! `reassociate` and re-arms. No transition reissues the association
//! inline, so two near-simultaneous attempts cannot happen. Retries are
//! unconditional and infinite: no backoff growth, no budget, no terminal
//! failure state.

use core::fmt;

use super::retry::RetryPolicy;

/// Observable connection state. Single writer (the management task);
/// everyone else reads snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Raw link status as reported by the radio driver on one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connected,
    /// Idle or scanning/associating — an attempt may be in flight.
    Searching,
    Failed,
    Disconnected,
}

/// State-change notification emitted on a transition. At most one per
/// poll, and only when the state actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Connected,
    Disconnected,
    Failed,
}

/// Side effects of one poll, for the management task to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub event: Option<LinkEvent>,
    /// Issue one reassociation request.
    pub reassociate: bool,
}

pub struct LinkStateMachine<P: RetryPolicy> {
    state: ConnectionState,
    /// Monotonic time at which the next reassociation is due, while the
    /// state is Disconnected or Failed.
    retry_due_ms: Option<u64>,
    policy: P,
}

impl<P: RetryPolicy> LinkStateMachine<P> {
    pub fn new(policy: P) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            retry_due_ms: None,
            policy,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// An explicit connect request: transition to Connecting. The caller
    /// issues the association itself, immediately, so the timer is
    /// disarmed until the attempt resolves.
    pub fn begin_connect(&mut self) {
        self.state = ConnectionState::Connecting;
        self.retry_due_ms = None;
    }

    /// An explicit disconnect request: the caller tears the association
    /// down and we report Disconnected. The retry timer re-arms — the
    /// retry loop is unconditional by design, and a later status poll
    /// keeps the machine live.
    pub fn begin_disconnect(&mut self, now_ms: u64) {
        self.state = ConnectionState::Disconnected;
        self.arm(now_ms);
    }

    /// Feed one polled status. Returns the transition notification (if
    /// the state changed) and whether a reassociation is due.
    pub fn poll(&mut self, status: LinkStatus, now_ms: u64) -> PollOutcome {
        let mut event = None;

        match status {
            LinkStatus::Connected => {
                if self.state != ConnectionState::Connected {
                    self.state = ConnectionState::Connected;
                    event = Some(LinkEvent::Connected);
                }
                self.retry_due_ms = None;
                self.policy.reset();
            }
            LinkStatus::Searching => {
                // An attempt is in flight; hold the retry timer.
                self.state = ConnectionState::Connecting;
                self.retry_due_ms = None;
            }
            LinkStatus::Failed => {
                if self.state != ConnectionState::Failed {
                    self.state = ConnectionState::Failed;
                    event = Some(LinkEvent::Failed);
                    self.arm(now_ms);
                }
            }
            LinkStatus::Disconnected => {
                if self.state != ConnectionState::Disconnected {
                    self.state = ConnectionState::Disconnected;
                    event = Some(LinkEvent::Disconnected);
                    self.arm(now_ms);
                }
            }
        }

        let mut reassociate = false;
        if matches!(
            self.state,
            ConnectionState::Disconnected | ConnectionState::Failed
        ) {
            match self.retry_due_ms {
                Some(due) if now_ms >= due => {
                    reassociate = true;
                    self.arm(now_ms);
                }
                Some(_) => {}
                // Unconnected with no timer (initial state): arm now.
                None => self.arm(now_ms),
            }
        }

        PollOutcome { event, reassociate }
    }

    fn arm(&mut self, now_ms: u64) {
        self.retry_due_ms = Some(now_ms + self.policy.next_delay_ms());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::retry::FixedDelay;

    const DELAY: u64 = 5000;

    fn machine() -> LinkStateMachine<FixedDelay> {
        LinkStateMachine::new(FixedDelay::new(DELAY))
    }

    #[test]
    fn starts_disconnected() {
        assert_eq!(machine().state(), ConnectionState::Disconnected);
    }

    #[test]
    fn connected_status_yields_exactly_one_notification() {
        let mut m = machine();
        m.begin_connect();

        let first = m.poll(LinkStatus::Connected, 0);
        assert_eq!(m.state(), ConnectionState::Connected);
        assert_eq!(first.event, Some(LinkEvent::Connected));
        assert!(!first.reassociate);

        // Staying connected is not a transition.
        for t in 1..10 {
            let out = m.poll(LinkStatus::Connected, t * 1000);
            assert_eq!(out.event, None);
            assert!(!out.reassociate);
        }
    }

    #[test]
    fn searching_moves_to_connecting_without_notification() {
        let mut m = machine();
        let out = m.poll(LinkStatus::Searching, 0);
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert_eq!(out.event, None);
        assert!(!out.reassociate);
    }

    #[test]
    fn failure_notifies_then_retries_after_the_delay() {
        let mut m = machine();
        m.begin_connect();

        let out = m.poll(LinkStatus::Failed, 1000);
        assert_eq!(m.state(), ConnectionState::Failed);
        assert_eq!(out.event, Some(LinkEvent::Failed));
        assert!(!out.reassociate, "no inline reissue on the transition");

        // Before the delay elapses: nothing.
        assert!(!m.poll(LinkStatus::Failed, 1000 + DELAY - 1).reassociate);
        // At the due time: exactly one.
        let due = m.poll(LinkStatus::Failed, 1000 + DELAY);
        assert_eq!(due.event, None);
        assert!(due.reassociate);
        // Re-armed, not repeating immediately.
        assert!(!m.poll(LinkStatus::Failed, 1001 + DELAY).reassociate);
    }

    #[test]
    fn one_reassociation_per_interval_while_unconnected() {
        let mut m = machine();
        m.begin_connect();
        m.poll(LinkStatus::Disconnected, 0);

        let mut attempts = 0;
        // Poll every second for 60s of simulated time.
        for t in (1..=60).map(|s| s * 1000) {
            if m.poll(LinkStatus::Disconnected, t).reassociate {
                attempts += 1;
            }
        }
        assert_eq!(attempts, 60_000 / DELAY);
    }

    #[test]
    fn no_reassociation_while_connected_or_connecting() {
        let mut m = machine();
        m.poll(LinkStatus::Connected, 0);
        for t in (1..100).map(|s| s * 1000) {
            assert!(!m.poll(LinkStatus::Connected, t).reassociate);
        }

        m.poll(LinkStatus::Searching, 100_000);
        for t in (101..200).map(|s| s * 1000) {
            assert!(!m.poll(LinkStatus::Searching, t).reassociate);
        }
    }

    #[test]
    fn lost_link_notifies_disconnected_and_rearms() {
        let mut m = machine();
        m.poll(LinkStatus::Connected, 0);

        let lost = m.poll(LinkStatus::Disconnected, 10_000);
        assert_eq!(lost.event, Some(LinkEvent::Disconnected));
        assert!(!lost.reassociate);
        assert!(m.poll(LinkStatus::Disconnected, 10_000 + DELAY).reassociate);
    }

    #[test]
    fn explicit_connect_disarms_the_timer() {
        let mut m = machine();
        m.poll(LinkStatus::Disconnected, 0);
        m.poll(LinkStatus::Disconnected, 1); // armed
        m.begin_connect();
        // Connecting suppresses retries entirely.
        assert!(!m.poll(LinkStatus::Searching, DELAY * 2).reassociate);
    }

    #[test]
    fn explicit_disconnect_reports_immediately_and_keeps_retrying() {
        let mut m = machine();
        m.poll(LinkStatus::Connected, 0);
        m.begin_disconnect(1000);
        assert_eq!(m.state(), ConnectionState::Disconnected);

        // The driver now reports disconnected; no duplicate notification
        // (the state is already Disconnected) and the timer holds.
        let out = m.poll(LinkStatus::Disconnected, 2000);
        assert_eq!(out.event, None);
        assert!(!out.reassociate);
        assert!(m.poll(LinkStatus::Disconnected, 1000 + DELAY).reassociate);
    }

    #[test]
    fn flapping_emits_one_notification_per_transition() {
        let mut m = machine();
        let mut events = Vec::new();
        let script = [
            (LinkStatus::Searching, 0),
            (LinkStatus::Connected, 1000),
            (LinkStatus::Disconnected, 2000),
            (LinkStatus::Searching, 3000),
            (LinkStatus::Connected, 4000),
            (LinkStatus::Failed, 5000),
        ];
        for (status, t) in script {
            if let Some(e) = m.poll(status, t).event {
                events.push(e);
            }
        }
        assert_eq!(
            events,
            vec![
                LinkEvent::Connected,
                LinkEvent::Disconnected,
                LinkEvent::Connected,
                LinkEvent::Failed,
            ]
        );
    }
}
