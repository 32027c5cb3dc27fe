//! Indicator pattern evaluation.
//!
//! Pure logic: a tick counter advances once per evaluation period and the
//! active pattern maps it to a binary output level.
//!
//! | Pattern    | Output rule                                    |
//! |-----------|------------------------------------------------|
//! | Off        | inactive always                                |
//! | Solid      | active always                                  |
//! | BlinkSlow  | toggles when `c % 10 == 0` (full period 10×T)  |
//! | BlinkFast  | toggles when `c % 2 == 0` (full period 2×T)    |
//! | Breathe    | quantized ramp, active above a fixed threshold |
//!
//! Breathe is a coarse binary approximation of a rising-then-resetting
//! brightness ramp: `level = (c % 20) * 12`, active iff `level > 100`.
//! The indicator has no PWM channel, so true variable intensity is not
//! attempted.

/// Selectable indicator pattern. No history — only the current value
/// matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorPattern {
    #[default]
    Off,
    Solid,
    BlinkSlow,
    BlinkFast,
    Breathe,
}

/// Quantized ramp step for Breathe.
const BREATHE_STEP: u32 = 12;
/// Ramp level above which the output is driven active.
const BREATHE_THRESHOLD: u32 = 100;

/// Per-tick pattern evaluator. Stack-allocated, no heap.
pub struct PatternEvaluator {
    counter: u32,
    lit: bool,
}

impl PatternEvaluator {
    pub fn new() -> Self {
        Self {
            counter: 0,
            lit: false,
        }
    }

    /// Advance one tick under `pattern` and return the output level
    /// (true = active).
    pub fn tick(&mut self, pattern: IndicatorPattern) -> bool {
        let c = self.counter;
        self.counter = self.counter.wrapping_add(1);

        match pattern {
            IndicatorPattern::Off => self.lit = false,
            IndicatorPattern::Solid => self.lit = true,
            IndicatorPattern::BlinkSlow => {
                if c % 10 == 0 {
                    self.lit = !self.lit;
                }
            }
            IndicatorPattern::BlinkFast => {
                if c % 2 == 0 {
                    self.lit = !self.lit;
                }
            }
            IndicatorPattern::Breathe => {
                self.lit = (c % 20) * BREATHE_STEP > BREATHE_THRESHOLD;
            }
        }
        self.lit
    }
}
