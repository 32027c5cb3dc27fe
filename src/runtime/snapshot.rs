//! Atomic-snapshot publish cell.
//!
//! One writer task publishes a complete value; any number of reader tasks
//! copy it out. Readers always observe either the previous complete value
//! or the new complete value — never a mix of fields from two
//! generations. The whole-value copy happens inside an `embassy-sync`
//! blocking mutex (critical section on the MCU, a `critical-section`
//! std shim in host tests), so no field-by-field assignment is ever
//! visible across a task boundary.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Shared "latest value" cell with copy-in / copy-out semantics.
pub struct Snapshot<T: Copy> {
    inner: Mutex<CriticalSectionRawMutex, Cell<T>>,
}

impl<T: Copy> Snapshot<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(initial)),
        }
    }

    /// Replace the stored value wholesale.
    pub fn publish(&self, value: T) {
        self.inner.lock(|cell| cell.set(value));
    }

    /// Copy out the current value. Never blocks for longer than the
    /// writer's own copy.
    pub fn get(&self) -> T {
        self.inner.lock(Cell::get)
    }
}
