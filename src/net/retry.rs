//! Reassociation retry policy.
//!
//! The state machine asks the policy how long to wait before the next
//! reassociation attempt; the policy never decides *whether* to retry —
//! retries are unconditional and infinite. Isolating the schedule behind
//! a trait lets a future firmware swap in backoff or circuit-breaking
//! without touching the state machine.

/// Strategy for spacing reassociation attempts.
pub trait RetryPolicy: Send {
    /// Delay, in milliseconds, before the next attempt is due.
    fn next_delay_ms(&mut self) -> u64;

    /// Called when the link reaches Connected.
    fn reset(&mut self);
}

/// Production policy: a fixed delay between attempts, forever. No
/// backoff growth, no attempt budget, no terminal failure state.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay_ms: u64,
}

impl FixedDelay {
    pub fn new(delay_ms: u64) -> Self {
        Self { delay_ms }
    }
}

impl RetryPolicy for FixedDelay {
    fn next_delay_ms(&mut self) -> u64 {
        self.delay_ms
    }

    fn reset(&mut self) {}
}
