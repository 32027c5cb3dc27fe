//! Indicator engine.
//!
//! Drives one binary output according to a caller-selected pattern.
//! The evaluation task runs at the middle of the three fixed priorities
//! and wakes once per tick using drift-free absolute-time scheduling:
//! each deadline is the previous deadline plus the tick period, never
//! completion time plus the period, so evaluation jitter does not
//! accumulate.
//!
//! Pattern changes arrive over a single-consumer channel. A send wakes
//! the task's timed wait so the value in effect at the next evaluation
//! is current, but it never shortens the scheduled tick delay itself —
//! worst-case pattern latency is one tick period.

pub mod output;
pub mod pattern;

use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::config::SystemConfig;
use crate::error::Result;
use crate::runtime::task::{self, Core, StopFlag, TaskHandle};

pub use output::IndicatorOutput;
pub use pattern::{IndicatorPattern, PatternEvaluator};

/// FreeRTOS priority for the evaluation task — between the sampler and
/// the connectivity manager.
const TASK_PRIORITY: u8 = 5;
const TASK_STACK_KB: usize = 2;

pub struct IndicatorEngine {
    output: IndicatorOutput,
    tick_period: Duration,
    stop_grace: Duration,
    pattern_tx: Option<mpsc::Sender<IndicatorPattern>>,
    task: Option<TaskHandle<()>>,
}

impl IndicatorEngine {
    /// Engine over `output`, pattern Off. Call [`start`](Self::start) to
    /// begin evaluation.
    pub fn new(output: IndicatorOutput, config: &SystemConfig) -> Self {
        Self {
            output,
            tick_period: Duration::from_millis(u64::from(config.indicator_tick_ms)),
            stop_grace: Duration::from_millis(u64::from(config.stop_grace_ms)),
            pattern_tx: None,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Spawn the evaluation task. Idempotent: a no-op while running.
    /// The output is forced inactive before the first evaluation and the
    /// pattern restarts from Off.
    pub fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel();
        let output = self.output.clone();
        let period = self.tick_period;
        let task = task::spawn(Core::App, TASK_PRIORITY, TASK_STACK_KB, "indicator\0", {
            move |stop| indicator_task(&output, &rx, period, &stop)
        })?;

        self.pattern_tx = Some(tx);
        self.task = Some(task);
        info!("indicator: started on GPIO {}", self.output.pin());
        Ok(())
    }

    /// Select the active pattern. Takes effect at the next evaluation,
    /// at most one tick period away. Dropped with a note if the engine
    /// is not running.
    pub fn set_pattern(&self, pattern: IndicatorPattern) {
        match &self.pattern_tx {
            Some(tx) if tx.send(pattern).is_ok() => {
                debug!("indicator: pattern -> {:?}", pattern);
            }
            _ => debug!("indicator: not running, pattern {:?} dropped", pattern),
        }
    }

    /// Stop the evaluation task (cooperative, bounded by the grace
    /// period) and force the output inactive.
    pub fn stop(&mut self) {
        // Closing the channel wakes the task out of its timed wait.
        self.pattern_tx = None;
        if let Some(task) = self.task.take() {
            let _ = task.stop(self.stop_grace);
        }
        // The task's exit path drives the output low itself; repeat here
        // so the level is guaranteed even after a detach.
        self.output.set_active(false);
        info!("indicator: stopped");
    }
}

fn indicator_task(
    output: &IndicatorOutput,
    rx: &mpsc::Receiver<IndicatorPattern>,
    period: Duration,
    stop: &StopFlag,
) {
    let mut evaluator = PatternEvaluator::new();
    let mut pattern = IndicatorPattern::Off;

    output.set_active(false);
    let mut deadline = Instant::now() + period;

    'run: loop {
        // Hold at the tick boundary, absorbing pattern updates as they
        // arrive. An update wakes us but the boundary stands.
        loop {
            if stop.is_set() {
                break 'run;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(p) => pattern = p,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break 'run,
            }
        }

        let lit = evaluator.tick(pattern);
        output.set_active(lit);
        deadline += period;
    }

    output.set_active(false);
    debug!("indicator: task exiting");
}
