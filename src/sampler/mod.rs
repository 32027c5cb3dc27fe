//! Sample producer.
//!
//! Highest-priority component task: synthesizes one complete [`Sample`]
//! per cycle and publishes it wholesale through a snapshot cell. Readers
//! calling [`SampleProducer::latest`] always get a self-consistent
//! record — either the previous sample or the new one, never a mix.
//!
//! Each cycle produces *first* and then waits, so the first sample is
//! available one synthesis after start rather than one full period
//! later. The wait is drift-free (absolute deadlines) and wakes early on
//! stop.

pub mod synth;

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::error::Result;
use crate::runtime::clock::MonotonicClock;
use crate::runtime::snapshot::Snapshot;
use crate::runtime::task::{self, Core, StopFlag, TaskHandle};

pub use synth::SampleSynth;

/// FreeRTOS priority for the synthesis task — highest of the three.
const TASK_PRIORITY: u8 = 6;
const TASK_STACK_KB: usize = 4;

/// One complete measurement record. Produced wholesale each cycle and
/// overwritten unconditionally; no averaging, no history.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub raw_value: u32,
    pub voltage: f32,
    pub temperature_c: f32,
    pub humidity_pct: f32,
    /// Monotonic milliseconds at synthesis time. 0 means "no sample yet".
    pub timestamp_ms: u64,
}

pub struct SampleProducer {
    interval: Duration,
    stop_grace: Duration,
    seed: u32,
    clock: MonotonicClock,
    latest: Arc<Snapshot<Sample>>,
    wake_tx: Option<mpsc::Sender<()>>,
    task: Option<TaskHandle<()>>,
}

impl SampleProducer {
    /// Producer holding a zeroed sample (timestamp 0). Call
    /// [`start`](Self::start) to begin synthesis.
    pub fn new(config: &SystemConfig) -> Self {
        Self::with_seed(config, 0x5EED_1234)
    }

    /// Like [`new`](Self::new) with an explicit RNG seed, for
    /// deterministic tests.
    pub fn with_seed(config: &SystemConfig, seed: u32) -> Self {
        Self {
            interval: Duration::from_millis(u64::from(config.sample_interval_ms)),
            stop_grace: Duration::from_millis(u64::from(config.stop_grace_ms)),
            seed,
            clock: MonotonicClock::new(),
            latest: Arc::new(Snapshot::new(Sample::default())),
            wake_tx: None,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Spawn the synthesis task. Idempotent: a no-op while running.
    /// The published sample resets to the zeroed record first.
    pub fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            return Ok(());
        }

        self.latest.publish(Sample::default());
        let (tx, rx) = mpsc::channel();
        let latest = Arc::clone(&self.latest);
        let clock = self.clock;
        let interval = self.interval;
        let seed = self.seed;
        let task = task::spawn(Core::App, TASK_PRIORITY, TASK_STACK_KB, "sampler\0", {
            move |stop| sampler_task(&latest, clock, interval, seed, &rx, &stop)
        })?;

        self.wake_tx = Some(tx);
        self.task = Some(task);
        info!("sampler: started (interval {:?})", self.interval);
        Ok(())
    }

    /// Copy of the most recent complete sample. Never blocks beyond the
    /// snapshot copy; a zeroed record (timestamp 0) means no cycle has
    /// completed yet.
    pub fn latest(&self) -> Sample {
        self.latest.get()
    }

    /// Stop the synthesis task (cooperative, bounded by the grace
    /// period). No hardware to tear down.
    pub fn stop(&mut self) {
        // Closing the wake channel gets the task out of its timed wait.
        self.wake_tx = None;
        if let Some(task) = self.task.take() {
            let _ = task.stop(self.stop_grace);
        }
        info!("sampler: stopped");
    }
}

fn sampler_task(
    latest: &Snapshot<Sample>,
    clock: MonotonicClock,
    interval: Duration,
    seed: u32,
    wake_rx: &mpsc::Receiver<()>,
    stop: &StopFlag,
) {
    let mut synth = SampleSynth::new(seed);
    let mut deadline = Instant::now();

    loop {
        let sample = synth.next(clock.uptime_ms());
        latest.publish(sample);

        deadline += interval;
        // The wake channel carries no data; it exists so a closing
        // sender ends the wait immediately on stop.
        loop {
            if stop.is_set() {
                debug!("sampler: task exiting");
                return;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match wake_rx.recv_timeout(remaining) {
                Ok(()) => {}
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("sampler: task exiting");
                    return;
                }
            }
        }
    }
}
