//! Counter entity state.
//!
//! A counter replicates an unbounded integer plus a display color. Both
//! fields follow the anyone-may-adjust policy: bumping a shared life total
//! or recoloring a marker is not a positional conflict, so neither requires
//! drag authority.

use serde::{Deserialize, Serialize};

use crate::sync::SyncField;

/// An RGBA display color, channels in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    /// Create a color.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Per-counter state on top of the playable base.
#[derive(Clone, Debug)]
pub struct CounterState {
    pub value: SyncField<i32>,
    pub color: SyncField<Color>,
}

impl CounterState {
    /// Create a counter showing `value`, colored white.
    #[must_use]
    pub fn new(value: i32) -> Self {
        Self {
            value: SyncField::new(value),
            color: SyncField::new(Color::WHITE),
        }
    }

    /// The value currently showing.
    #[must_use]
    pub fn current(&self) -> i32 {
        *self.value.get()
    }
}
