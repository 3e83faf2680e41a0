//! Zone containers and the drop-position layout engine.
//!
//! A zone is a region of the table that owns an ordered list of child
//! playables. Area zones are free-form (children keep their dropped
//! position, optionally snapped to a grid); horizontal and vertical zones
//! are lists whose child order is derived from position along the layout
//! axis. Sibling positions in a vertical list descend in Y and in a
//! horizontal list ascend in X, so the insertion scan walks the existing
//! children in that order and slots the drop target in.

use serde::{Deserialize, Serialize};

use crate::core::{PlayableId, Vec2};
use crate::table::card::CardAction;

/// How a zone arranges its children.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ZoneLayout {
    /// Free placement; an optional grid cell size snaps dropped positions.
    Area { grid: Option<f32> },
    /// Ordered row, ascending X.
    Horizontal,
    /// Ordered column, descending Y.
    Vertical,
}

/// Facing imposed on cards added to a zone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacePreference {
    /// Keep whatever facing the card arrived with.
    #[default]
    Any,
    Up,
    Down,
}

/// Per-zone state on top of the playable base.
#[derive(Clone, Debug)]
pub struct ZoneState {
    pub layout: ZoneLayout,
    /// Extent of the zone's drop region, centered on its position.
    pub size: Vec2,
    pub face_preference: FacePreference,
    /// Assigned to cards on add as their double-click action.
    pub default_action: Option<CardAction>,
    /// Dropping here commits immediately instead of animating to a
    /// placeholder first.
    pub immediate_release: bool,
    /// List zones that overflow forward drag gestures as scrolling.
    pub scrollable: bool,
    children: Vec<PlayableId>,
}

impl ZoneState {
    /// Create a zone with the given layout and drop-region size.
    #[must_use]
    pub fn new(layout: ZoneLayout, size: Vec2) -> Self {
        Self {
            layout,
            size,
            face_preference: FacePreference::Any,
            default_action: None,
            immediate_release: false,
            scrollable: false,
            children: Vec::new(),
        }
    }

    /// Is this an ordered list rather than a free-form area?
    #[must_use]
    pub fn is_list(&self) -> bool {
        !matches!(self.layout, ZoneLayout::Area { .. })
    }

    /// The grid cell size, for area zones that snap.
    #[must_use]
    pub fn grid(&self) -> Option<f32> {
        match self.layout {
            ZoneLayout::Area { grid } => grid,
            _ => None,
        }
    }

    /// Ordered child playables.
    #[must_use]
    pub fn children(&self) -> &[PlayableId] {
        &self.children
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Is the zone empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Index of a child, if present.
    #[must_use]
    pub fn index_of(&self, child: PlayableId) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    /// Insert a child at `index` (clamped). Re-inserting a present child
    /// moves it instead. Returns the index actually used.
    pub fn insert_child(&mut self, index: usize, child: PlayableId) -> usize {
        self.children.retain(|&c| c != child);
        let index = index.min(self.children.len());
        self.children.insert(index, child);
        index
    }

    /// Remove a child if present. Returns whether it was removed.
    pub fn remove_child(&mut self, child: PlayableId) -> bool {
        let before = self.children.len();
        self.children.retain(|&c| c != child);
        self.children.len() != before
    }
}

/// Where a dropped playable slots into a list zone's child order.
///
/// `positions` are the current children's positions in child order;
/// `current` is the dropped playable's own index when it is already a child
/// (a reorder within the zone). The scan walks siblings in layout order
/// (descending Y for vertical, ascending X for horizontal) and stops at the
/// first sibling the target sits before; removing the playable from its
/// current slot shifts later indices down by one, which the scan accounts
/// for.
#[must_use]
pub fn insertion_index(
    layout: ZoneLayout,
    positions: &[Vec2],
    target: Vec2,
    current: Option<usize>,
) -> usize {
    let vertical = matches!(layout, ZoneLayout::Vertical);
    let mut index = positions.len();
    for (i, p) in positions.iter().enumerate() {
        if Some(i) == current {
            continue;
        }
        let past = if vertical {
            target.y < p.y
        } else {
            target.x > p.x
        };
        if past {
            continue;
        }
        index = i;
        break;
    }
    if let Some(current) = current {
        if current < index {
            index -= 1;
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(id: u32) -> PlayableId {
        PlayableId(id)
    }

    #[test]
    fn test_area_zone_properties() {
        let zone = ZoneState::new(ZoneLayout::Area { grid: Some(50.0) }, Vec2::new(400.0, 300.0));
        assert!(!zone.is_list());
        assert_eq!(zone.grid(), Some(50.0));
    }

    #[test]
    fn test_insert_child_clamps_and_moves() {
        let mut zone = ZoneState::new(ZoneLayout::Horizontal, Vec2::new(400.0, 100.0));

        assert_eq!(zone.insert_child(99, obj(1)), 0);
        assert_eq!(zone.insert_child(99, obj(2)), 1);

        // Re-inserting moves rather than duplicates.
        assert_eq!(zone.insert_child(0, obj(2)), 0);
        assert_eq!(zone.children(), &[obj(2), obj(1)]);
    }

    #[test]
    fn test_remove_child() {
        let mut zone = ZoneState::new(ZoneLayout::Vertical, Vec2::new(100.0, 400.0));
        zone.insert_child(0, obj(1));

        assert!(zone.remove_child(obj(1)));
        assert!(!zone.remove_child(obj(1)));
        assert!(zone.is_empty());
    }

    #[test]
    fn test_vertical_insertion_between_siblings() {
        // Children laid out top to bottom: Y 30, 20, 10.
        let positions = [
            Vec2::new(0.0, 30.0),
            Vec2::new(0.0, 20.0),
            Vec2::new(0.0, 10.0),
        ];

        // Dropping at Y=25 lands between the first two.
        assert_eq!(
            insertion_index(ZoneLayout::Vertical, &positions, Vec2::new(0.0, 25.0), None),
            1
        );
        // Above everything: index 0. Below everything: the end.
        assert_eq!(
            insertion_index(ZoneLayout::Vertical, &positions, Vec2::new(0.0, 99.0), None),
            0
        );
        assert_eq!(
            insertion_index(ZoneLayout::Vertical, &positions, Vec2::new(0.0, 5.0), None),
            3
        );
    }

    #[test]
    fn test_horizontal_insertion() {
        // Children laid out left to right: X 10, 20, 30.
        let positions = [
            Vec2::new(10.0, 0.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(30.0, 0.0),
        ];

        assert_eq!(
            insertion_index(ZoneLayout::Horizontal, &positions, Vec2::new(15.0, 0.0), None),
            1
        );
        assert_eq!(
            insertion_index(ZoneLayout::Horizontal, &positions, Vec2::new(5.0, 0.0), None),
            0
        );
        assert_eq!(
            insertion_index(ZoneLayout::Horizontal, &positions, Vec2::new(99.0, 0.0), None),
            3
        );
    }

    #[test]
    fn test_reorder_accounts_for_own_slot() {
        // The playable at index 0 (X=10) dragged right past its neighbors.
        let positions = [
            Vec2::new(10.0, 0.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(30.0, 0.0),
        ];

        // Target X=25 sits before the child at index 2, but removing index 0
        // first shifts that down to 1.
        assert_eq!(
            insertion_index(
                ZoneLayout::Horizontal,
                &positions,
                Vec2::new(25.0, 0.0),
                Some(0)
            ),
            1
        );

        // Dragged left of itself: no shift.
        assert_eq!(
            insertion_index(
                ZoneLayout::Horizontal,
                &positions,
                Vec2::new(5.0, 0.0),
                Some(2)
            ),
            0
        );
    }

    #[test]
    fn test_empty_zone_inserts_at_zero() {
        assert_eq!(
            insertion_index(ZoneLayout::Vertical, &[], Vec2::ZERO, None),
            0
        );
    }
}
