//! Shared task-runtime primitives.
//!
//! Everything the three component tasks have in common lives here: the
//! torn-read-free snapshot cell, the cooperative-stop task handles, and
//! the monotonic clock.

pub mod clock;
pub mod snapshot;
pub mod task;
