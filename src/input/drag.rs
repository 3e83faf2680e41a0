//! Drag gesture state machine.
//!
//! Each playable tracks its own active pointers. A gesture moves linearly
//! through `Begin -> Drag -> End`; re-entering `Begin` starts a new gesture.
//! The target position on every drag tick is the mean of the current
//! pointer positions plus the mean of the grab offsets captured on press,
//! which lets multiple simultaneous pointers blend smoothly.
//!
//! Holding a pointer without dragging past a configurable threshold raises
//! a one-shot preview flag (the "hold-to-preview" affordance); it does not
//! change the drag phase.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{PointerId, Vec2};

/// Lifecycle of a single continuous pointer-driven manipulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragPhase {
    Begin,
    Drag,
    End,
}

/// Visual highlight derived from drag and authority state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HighlightMode {
    #[default]
    Off,
    /// Selected by the local participant.
    Selected,
    /// Local participant holds authority and is manipulating.
    Authorized,
    /// Dragging with nowhere to land.
    Warn,
}

/// Per-playable pointer tracking.
#[derive(Clone, Debug, Default)]
pub struct DragTracker {
    /// Last seen position of each active pointer.
    pointer_positions: FxHashMap<PointerId, Vec2>,
    /// Grab offset captured at press: object position minus pointer position.
    drag_offsets: FxHashMap<PointerId, Vec2>,
    phase: Option<DragPhase>,
    hold_time: f32,
    did_drag: bool,
    preview_fired: bool,
}

impl DragTracker {
    /// Create an idle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A pointer pressed on the playable.
    pub fn pointer_down(&mut self, pointer: PointerId, pointer_pos: Vec2, object_pos: Vec2) {
        self.pointer_positions.insert(pointer, pointer_pos);
        self.drag_offsets.insert(pointer, object_pos - pointer_pos);
    }

    /// A pointer released without this being the end of a drag.
    ///
    /// During an active `Drag` phase the release is handled by [`end`]
    /// instead, so this is a no-op then.
    ///
    /// [`end`]: DragTracker::end
    pub fn pointer_up(&mut self, pointer: PointerId) {
        if self.phase == Some(DragPhase::Drag) {
            return;
        }
        self.pointer_positions.remove(&pointer);
        self.drag_offsets.remove(&pointer);
        if self.did_drag && self.drag_offsets.is_empty() {
            self.did_drag = false;
        }
        if self.pointer_positions.is_empty() {
            self.hold_time = 0.0;
            self.preview_fired = false;
        }
    }

    /// Transition to `Begin`, starting a new gesture.
    pub fn begin(&mut self, pointer: PointerId, pointer_pos: Vec2) {
        self.phase = Some(DragPhase::Begin);
        self.did_drag = true;
        self.pointer_positions.insert(pointer, pointer_pos);
    }

    /// A drag tick: update the pointer and move to the `Drag` phase.
    pub fn drag(&mut self, pointer: PointerId, pointer_pos: Vec2) {
        self.phase = Some(DragPhase::Drag);
        self.pointer_positions.insert(pointer, pointer_pos);
    }

    /// The gesture's final tick for this pointer.
    ///
    /// Removes the pointer and redistributes its grab offset across the
    /// surviving pointers so the blended target does not jump.
    pub fn end(&mut self, pointer: PointerId, pointer_pos: Vec2, object_pos: Vec2) {
        self.phase = Some(DragPhase::End);
        self.pointer_positions.insert(pointer, pointer_pos);

        let removed_offset = match self.drag_offsets.get(&pointer) {
            Some(&offset) => object_pos - pointer_pos - offset,
            None => Vec2::ZERO,
        };
        self.pointer_positions.remove(&pointer);
        self.drag_offsets.remove(&pointer);

        let survivors: SmallVec<[PointerId; 4]> = self.drag_offsets.keys().copied().collect();
        for id in survivors {
            if let Some(offset) = self.drag_offsets.get_mut(&id) {
                *offset = *offset - removed_offset;
            }
        }

        if self.drag_offsets.is_empty() {
            self.did_drag = false;
            self.hold_time = 0.0;
            self.preview_fired = false;
        }
    }

    /// Blended target position: mean pointer position plus mean grab offset.
    ///
    /// `None` while no pointer is captured.
    #[must_use]
    pub fn target_position(&self) -> Option<Vec2> {
        if self.pointer_positions.is_empty() || self.drag_offsets.is_empty() {
            return None;
        }
        let pointers = Vec2::mean(self.pointer_positions.values().copied());
        let offsets = Vec2::mean(self.drag_offsets.values().copied());
        Some(pointers + offsets)
    }

    /// Mean of the captured pointer positions, for hit testing.
    ///
    /// `None` while no pointer is captured.
    #[must_use]
    pub fn pointer_centroid(&self) -> Option<Vec2> {
        if self.pointer_positions.is_empty() {
            return None;
        }
        Some(Vec2::mean(self.pointer_positions.values().copied()))
    }

    /// Advance the hold timer. Returns `true` exactly once per gesture when
    /// the hold threshold is crossed without dragging.
    pub fn tick_hold(&mut self, dt: f32, threshold: f32) -> bool {
        if self.pointer_positions.is_empty() || self.did_drag {
            self.hold_time = 0.0;
            return false;
        }
        self.hold_time += dt;
        if self.hold_time > threshold && !self.preview_fired {
            self.preview_fired = true;
            return true;
        }
        false
    }

    /// Abandon all pointer tracking (e.g. the gesture turned into a zoom).
    pub fn reset(&mut self) {
        self.pointer_positions.clear();
        self.drag_offsets.clear();
        self.phase = None;
        self.hold_time = 0.0;
        self.did_drag = false;
        self.preview_fired = false;
    }

    /// Current phase, if a gesture is in flight.
    #[must_use]
    pub fn phase(&self) -> Option<DragPhase> {
        self.phase
    }

    /// Number of captured pointers.
    #[must_use]
    pub fn active_pointers(&self) -> usize {
        self.pointer_positions.len()
    }

    /// Time the current pointers have been held without dragging.
    #[must_use]
    pub fn hold_time(&self) -> f32 {
        self.hold_time
    }

    /// Has this gesture produced any drag tick?
    #[must_use]
    pub fn did_drag(&self) -> bool {
        self.did_drag
    }
}
