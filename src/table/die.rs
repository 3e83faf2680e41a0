//! Die entity state.
//!
//! A die replicates a single bounded integer. Rolling animates host-side:
//! the host re-randomizes the value on a short interval for the roll
//! duration and broadcasts each intermediate value, so every participant
//! sees the same tumbling sequence. Manual increments wrap around the
//! bounds.

use crate::core::TableRng;
use crate::sync::SyncField;

/// How long a roll tumbles before settling, in seconds.
pub const ROLL_TIME: f32 = 1.0;
/// Interval between intermediate values during a roll, in seconds.
pub const ROLL_DELAY: f32 = 0.05;

pub const DEFAULT_MIN: i32 = 1;
pub const DEFAULT_MAX: i32 = 6;

/// Per-die state on top of the playable base.
#[derive(Clone, Debug)]
pub struct DieState {
    pub min: i32,
    pub max: i32,
    pub value: SyncField<i32>,
    roll_remaining: f32,
    roll_delay: f32,
}

impl DieState {
    /// Create a die showing `min`.
    ///
    /// Inverted bounds are normalized by swapping.
    #[must_use]
    pub fn new(min: i32, max: i32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            value: SyncField::new(min),
            roll_remaining: 0.0,
            roll_delay: 0.0,
        }
    }

    /// A standard six-sided die.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(DEFAULT_MIN, DEFAULT_MAX)
    }

    /// The face currently showing.
    #[must_use]
    pub fn current(&self) -> i32 {
        *self.value.get()
    }

    /// Begin (or restart) a tumbling roll.
    pub fn start_roll(&mut self) {
        self.roll_remaining = ROLL_TIME;
        self.roll_delay = 0.0;
    }

    /// Is a roll in progress?
    #[must_use]
    pub fn is_rolling(&self) -> bool {
        self.roll_remaining > 0.0
    }

    /// Advance the roll animation. Returns a fresh intermediate (or final)
    /// value when one is due this tick.
    ///
    /// Only the authoritative side calls this; the returned values are
    /// broadcast like any other value change.
    pub fn tick(&mut self, dt: f32, rng: &mut TableRng) -> Option<i32> {
        if self.roll_remaining <= 0.0 {
            return None;
        }
        self.roll_remaining -= dt;
        self.roll_delay -= dt;
        if self.roll_delay > 0.0 && self.roll_remaining > 0.0 {
            return None;
        }
        self.roll_delay = ROLL_DELAY;
        let value = rng.roll(self.min, self.max);
        self.value.set_local(value);
        Some(value)
    }

    /// Clamp-wrap a value into bounds: past the max wraps to the min and
    /// vice versa.
    #[must_use]
    pub fn wrap(&self, value: i32) -> i32 {
        if value > self.max {
            self.min
        } else if value < self.min {
            self.max
        } else {
            value
        }
    }

    /// The value one step up, wrapping.
    #[must_use]
    pub fn incremented(&self) -> i32 {
        self.wrap(self.current() + 1)
    }

    /// The value one step down, wrapping.
    #[must_use]
    pub fn decremented(&self) -> i32 {
        self.wrap(self.current() - 1)
    }
}
