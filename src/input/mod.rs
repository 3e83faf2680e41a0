//! Pointer input: the drag gesture state machine.

pub mod drag;

pub use drag::{DragPhase, DragTracker, HighlightMode};
