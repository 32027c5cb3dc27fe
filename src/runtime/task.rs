//! Component task spawning and the cooperative stop handshake.
//!
//! On ESP-IDF a component task is a FreeRTOS task created through the
//! pthread layer: `esp_pthread_set_cfg()` sets thread-local configuration
//! (core affinity, priority, stack size) that applies to the *next*
//! `pthread_create()` from the calling thread, so the config→spawn pair
//! must not be interleaved with other thread creation on the same
//! thread. Non-ESP targets fall back to plain threads and ignore core
//! and priority.
//!
//! ## Stop handshake
//!
//! A spawned task receives a [`StopFlag`]. Its owner calls
//! [`TaskHandle::stop`], which raises the flag and then waits on a
//! completion channel the task wrapper signals just before returning.
//! If the task does not acknowledge within the grace period it is
//! *detached*, not killed — Rust threads cannot be forcibly terminated —
//! and the owner reclaims whatever it can without the task's return
//! value. Waking a task that is blocked in a timed channel wait is the
//! owner's job: dropping the command sender makes `recv_timeout` return
//! `Disconnected` immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::{Error, Result};

/// CPU core identifiers for the ESP32-S3 Xtensa LX7 dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU) — protocol stacks (WiFi, lwIP).
    Pro = 0,
    /// Core 1 (APP_CPU) — application logic.
    App = 1,
}

/// Cooperative stop signal shared between a task and its owner.
#[derive(Clone)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// True once the owner has requested the task to exit.
    /// Tasks check this once per wait cycle.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Owner-side handle for a spawned task.
pub struct TaskHandle<T> {
    name: &'static str,
    flag: StopFlag,
    done_rx: mpsc::Receiver<()>,
    join: Option<JoinHandle<T>>,
}

impl<T> TaskHandle<T> {
    /// Request a cooperative stop and wait up to `grace` for the task to
    /// acknowledge. Returns the task's return value on a clean exit,
    /// `None` if the task had to be detached (or panicked).
    pub fn stop(mut self, grace: Duration) -> Option<T> {
        self.flag.set();
        match self.done_rx.recv_timeout(grace) {
            // Acknowledged (or the task already finished and the sender
            // is gone) — the join completes promptly.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                self.join.take().and_then(|j| j.join().ok())
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "task '{}' did not acknowledge stop within {:?}; detaching",
                    self.name,
                    grace
                );
                None
            }
        }
    }
}

/// Spawn a component task with explicit core, priority and stack size.
///
/// `f` runs on the new task and receives the [`StopFlag`]; its return
/// value is handed back to the owner by [`TaskHandle::stop`] on a clean
/// exit. The `name` must be null-terminated (e.g. `"sampler\0"`) for the
/// FreeRTOS task name.
pub fn spawn<T, F>(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: F,
) -> Result<TaskHandle<T>>
where
    T: Send + 'static,
    F: FnOnce(StopFlag) -> T + Send + 'static,
{
    let flag = StopFlag::new();
    let (done_tx, done_rx) = mpsc::channel();

    let task_flag = flag.clone();
    let join = spawn_thread(core, priority, stack_kb, name, move || {
        let out = f(task_flag);
        // Completion acknowledgment for the stop handshake. The owner
        // may already be gone; that is fine.
        let _ = done_tx.send(());
        out
    })?;

    Ok(TaskHandle {
        name,
        flag,
        done_rx,
        join: Some(join),
    })
}

#[cfg(target_os = "espidf")]
fn spawn_thread<T, F>(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: F,
) -> Result<JoinHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = priority as i32;
        cfg.stack_size = (stack_kb * 1024) as i32;
        cfg.thread_name = name.as_ptr() as *const _;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            log::error!("esp_pthread_set_cfg failed: {ret}");
            return Err(Error::Spawn("esp_pthread_set_cfg failed"));
        }
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        core,
        priority,
        stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
        .map_err(|_| Error::Spawn("thread creation failed"))
}

/// Simulation fallback — ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
fn spawn_thread<T, F>(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: F,
) -> Result<JoinHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let display_name = name.trim_end_matches('\0');
    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
        .map_err(|_| Error::Spawn("thread creation failed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn clean_stop_returns_task_value() {
        let handle = spawn(Core::App, 5, 1, "t-clean\0", |stop| {
            while !stop.is_set() {
                std::thread::sleep(Duration::from_millis(1));
            }
            42u32
        })
        .unwrap();

        assert_eq!(handle.stop(Duration::from_millis(500)), Some(42));
    }

    #[test]
    fn finished_task_joins_without_grace_wait() {
        let handle = spawn(Core::App, 5, 1, "t-done\0", |_stop| 7u8).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        let begun = Instant::now();
        assert_eq!(handle.stop(Duration::from_secs(5)), Some(7));
        assert!(begun.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn unresponsive_task_is_detached_after_grace() {
        let handle = spawn(Core::App, 5, 1, "t-stuck\0", |_stop| {
            // Ignores the stop flag for far longer than the grace period.
            std::thread::sleep(Duration::from_millis(400));
        })
        .unwrap();

        let begun = Instant::now();
        assert_eq!(handle.stop(Duration::from_millis(50)), None);
        let waited = begun.elapsed();
        assert!(waited >= Duration::from_millis(50));
        assert!(waited < Duration::from_millis(300), "must not wait for the task");
    }
}
