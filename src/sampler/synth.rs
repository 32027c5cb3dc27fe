//! Synthetic sample source.
//!
//! No sensor is attached; the values are pseudo-random draws shaped into
//! plausible ranges. A seedable xorshift core keeps the stream
//! deterministic for tests.

use super::Sample;

/// Marsaglia xorshift32. Good enough for synthetic telemetry, tiny, and
/// fully deterministic from the seed.
struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    fn new(seed: u32) -> Self {
        // State must never be zero or the stream collapses.
        Self {
            state: if seed == 0 { 0xDEAD_BEEF } else { seed },
        }
    }

    fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

/// Draws complete [`Sample`]s with fields in fixed plausible ranges:
/// raw 1000-1999 counts, 1.5-2.5 V, 20-40 °C, 30-80 %RH.
pub struct SampleSynth {
    rng: XorShift32,
}

impl SampleSynth {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: XorShift32::new(seed),
        }
    }

    /// One complete sample, timestamped by the caller.
    pub fn next(&mut self, timestamp_ms: u64) -> Sample {
        Sample {
            raw_value: 1000 + self.rng.next() % 1000,
            voltage: 1.5 + (self.rng.next() % 1000) as f32 / 1000.0,
            temperature_c: 20.0 + (self.rng.next() % 200) as f32 / 10.0,
            humidity_pct: 30.0 + (self.rng.next() % 500) as f32 / 10.0,
            timestamp_ms,
        }
    }
}
