//! Connectivity manager.
//!
//! Owns one logical network association: a management task polls the
//! radio link once per poll interval, drives the [`LinkStateMachine`],
//! publishes the resulting [`ConnectionState`] through a snapshot cell
//! and hands transition notifications to a [`LinkEventSink`].
//!
//! The task is the *only* writer of the state. Explicit `connect()` /
//! `disconnect()` requests therefore travel over a command channel
//! instead of mutating anything directly; a send wakes the task out of
//! its timed wait, so an association request goes out immediately rather
//! than on the next poll boundary.

pub mod link;
pub mod machine;
pub mod retry;

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::{SystemConfig, WifiCredentials};
use crate::error::{LinkError, Result};
use crate::runtime::clock::MonotonicClock;
use crate::runtime::snapshot::Snapshot;
use crate::runtime::task::{self, Core, StopFlag, TaskHandle};

pub use link::{LinkPort, WifiLink};
pub use machine::{ConnectionState, LinkEvent, LinkStateMachine, LinkStatus};
pub use retry::{FixedDelay, RetryPolicy};

/// FreeRTOS priority for the management task — the lowest of the three
/// component tasks.
const TASK_PRIORITY: u8 = 4;
/// The WiFi driver calls need more headroom than the other tasks.
const TASK_STACK_KB: usize = 8;

/// Consumer of link state-change notifications.
pub trait LinkEventSink: Send {
    fn emit(&mut self, event: LinkEvent);
}

/// Production sink: one structured log line per transition.
pub struct LogLinkSink;

impl LinkEventSink for LogLinkSink {
    fn emit(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Connected => info!("net: link up"),
            LinkEvent::Disconnected => warn!("net: link down"),
            LinkEvent::Failed => warn!("net: association failed"),
        }
    }
}

enum Command {
    Connect,
    Disconnect,
}

pub struct ConnectivityManager<L: LinkPort + 'static, S: LinkEventSink + 'static> {
    credentials: WifiCredentials,
    poll_interval: Duration,
    retry_delay_ms: u64,
    stop_grace: Duration,
    clock: MonotonicClock,
    state: Arc<Snapshot<ConnectionState>>,
    /// Link driver and sink, held here while the task is not running.
    /// `None` while the task owns them — and permanently `None` if a
    /// stopping task had to be detached with the driver still inside.
    parts: Option<(L, S)>,
    cmd_tx: Option<mpsc::Sender<Command>>,
    task: Option<TaskHandle<(L, S)>>,
}

impl<L: LinkPort + 'static, S: LinkEventSink + 'static> ConnectivityManager<L, S> {
    /// Manager in state Disconnected. Call [`start`](Self::start) to
    /// begin polling.
    pub fn new(credentials: WifiCredentials, link: L, sink: S, config: &SystemConfig) -> Self {
        Self {
            credentials,
            poll_interval: Duration::from_millis(u64::from(config.link_poll_interval_ms)),
            retry_delay_ms: u64::from(config.link_retry_delay_ms),
            stop_grace: Duration::from_millis(u64::from(config.stop_grace_ms)),
            clock: MonotonicClock::new(),
            state: Arc::new(Snapshot::new(ConnectionState::Disconnected)),
            parts: Some((link, sink)),
            cmd_tx: None,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Spawn the management task. Idempotent: a no-op while running.
    /// State is Disconnected before the first poll.
    pub fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            return Ok(());
        }
        // A previously detached task still holds the radio driver.
        let (link, sink) = self.parts.take().ok_or(LinkError::RadioUnavailable)?;

        self.state.publish(ConnectionState::Disconnected);
        let (tx, rx) = mpsc::channel();
        let ctx = TaskContext {
            link,
            sink,
            credentials: self.credentials.clone(),
            machine: LinkStateMachine::new(FixedDelay::new(self.retry_delay_ms)),
            state: Arc::clone(&self.state),
            clock: self.clock,
            poll_interval: self.poll_interval,
        };
        let task = match task::spawn(Core::Pro, TASK_PRIORITY, TASK_STACK_KB, "wifi\0", {
            move |stop| net_task(ctx, &rx, &stop)
        }) {
            Ok(task) => task,
            Err(e) => {
                // The closure never ran; the driver is unreachable now.
                warn!("net: start failed: {e}");
                return Err(e);
            }
        };

        self.cmd_tx = Some(tx);
        self.task = Some(task);
        info!("net: started (poll {:?})", self.poll_interval);
        Ok(())
    }

    /// Request an immediate association. Dropped with a note if the
    /// manager is not running.
    pub fn connect(&self) {
        self.send(Command::Connect);
    }

    /// Request association teardown.
    pub fn disconnect(&self) {
        self.send(Command::Disconnect);
    }

    fn send(&self, cmd: Command) {
        match &self.cmd_tx {
            Some(tx) if tx.send(cmd).is_ok() => {}
            _ => debug!("net: not running, command dropped"),
        }
    }

    /// Current connection state. Never blocks beyond the snapshot copy.
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Stop the management task (cooperative, bounded by the grace
    /// period). The task disassociates on exit and returns the driver so
    /// a later [`start`](Self::start) can reuse it.
    pub fn stop(&mut self) {
        // Closing the command channel wakes the task out of its wait.
        self.cmd_tx = None;
        if let Some(task) = self.task.take() {
            match task.stop(self.stop_grace) {
                Some(parts) => self.parts = Some(parts),
                None => warn!("net: task detached; radio driver lost until reboot"),
            }
        }
        self.state.publish(ConnectionState::Disconnected);
        info!("net: stopped");
    }
}

/// Everything the management task owns, moved in at spawn.
struct TaskContext<L, S> {
    link: L,
    sink: S,
    credentials: WifiCredentials,
    machine: LinkStateMachine<FixedDelay>,
    state: Arc<Snapshot<ConnectionState>>,
    clock: MonotonicClock,
    poll_interval: Duration,
}

fn net_task<L: LinkPort, S: LinkEventSink>(
    mut ctx: TaskContext<L, S>,
    rx: &mpsc::Receiver<Command>,
    stop: &StopFlag,
) -> (L, S) {
    let mut deadline = Instant::now() + ctx.poll_interval;

    'run: loop {
        // Hold at the poll boundary; commands wake us and act at once.
        loop {
            if stop.is_set() {
                break 'run;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(Command::Connect) => {
                    ctx.machine.begin_connect();
                    ctx.state.publish(ctx.machine.state());
                    if let Err(e) = ctx.link.associate(&ctx.credentials) {
                        warn!("net: association request failed: {e}");
                    }
                }
                Ok(Command::Disconnect) => {
                    ctx.link.disassociate();
                    ctx.machine.begin_disconnect(ctx.clock.uptime_ms());
                    ctx.state.publish(ctx.machine.state());
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break 'run,
            }
        }

        let status = ctx.link.status();
        let outcome = ctx.machine.poll(status, ctx.clock.uptime_ms());
        ctx.state.publish(ctx.machine.state());
        if let Some(event) = outcome.event {
            ctx.sink.emit(event);
        }
        if outcome.reassociate {
            debug!("net: reassociating");
            if let Err(e) = ctx.link.associate(&ctx.credentials) {
                warn!("net: reassociation failed: {e}");
            }
        }
        deadline += ctx.poll_interval;
    }

    ctx.link.disassociate();
    ctx.state.publish(ConnectionState::Disconnected);
    debug!("net: task exiting");
    (ctx.link, ctx.sink)
}
