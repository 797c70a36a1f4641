// Bounded accumulators that gate every timed behavior in the sim.
//
// A single generic `Accumulator<T>` covers both the float-based timers
// (movement, digging, waiting, flooding, camp spawning) and integer counters.
// `advance()` adds an amount and reports whether the accumulated value has
// gone strictly past the maximum. Auto-resetting accumulators snap back to
// zero when that happens; one-shot accumulators keep their value, so
// `is_complete()` stays true afterwards.
//
// Note the two thresholds: `advance()` fires on `current > max`, while
// `is_complete()` is `current >= max`. Block flooding relies on the
// difference (see `block.rs`).
//
// See also: `agent.rs` and `structure.rs` which own most timers,
// `block.rs` for the one-shot flood timer.

use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Numeric types an `Accumulator` can hold.
pub trait Accumulate: Copy + PartialOrd + Add<Output = Self> + Default {}

impl<T: Copy + PartialOrd + Add<Output = T> + Default> Accumulate for T {}

/// Accumulates a quantity toward a maximum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Accumulator<T> {
    max: T,
    current: T,
    auto_reset: bool,
}

/// Time accumulator, in simulated seconds.
pub type Timer = Accumulator<f32>;

/// Whole-step accumulator.
pub type Counter = Accumulator<u32>;

impl<T: Accumulate> Accumulator<T> {
    /// An auto-resetting accumulator starting at zero.
    pub fn new(max: T) -> Self {
        Self {
            max,
            current: T::default(),
            auto_reset: true,
        }
    }

    /// An accumulator that holds its value once it passes the maximum.
    pub fn one_shot(max: T) -> Self {
        Self {
            auto_reset: false,
            ..Self::new(max)
        }
    }

    /// Add `amount`. Returns `true` on the call where the value exceeds the
    /// maximum (and resets it to zero if auto-resetting).
    pub fn advance(&mut self, amount: T) -> bool {
        self.current = self.current + amount;
        if self.max < self.current {
            if self.auto_reset {
                self.current = T::default();
            }
            return true;
        }
        false
    }

    /// Whether the accumulated value has reached the maximum.
    pub fn is_complete(&self) -> bool {
        self.current >= self.max
    }

    /// Jump straight to the maximum.
    pub fn complete(&mut self) {
        self.current = self.max;
    }

    pub fn current(&self) -> T {
        self.current
    }

    pub fn max(&self) -> T {
        self.max
    }

    /// Change the maximum without touching the accumulated value. Movement
    /// timers recompute theirs from block size and speed on every step.
    pub fn set_max(&mut self, max: T) {
        self.max = max;
    }
}
