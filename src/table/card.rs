//! Card entity state.
//!
//! A card is the base replicated playable plus an identity into the
//! external catalog and a face-orientation flag. Face state is its own
//! replicated field with an anyone-may-request write policy: flipping a
//! card is not a positional conflict, so it never requires drag authority.

use serde::{Deserialize, Serialize};

use crate::core::CardId;
use crate::sync::SyncField;

/// Default double-click action a zone may assign to cards added to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardAction {
    Flip,
    Rotate,
    Tap,
    Discard,
}

/// Speed at which a released card approaches its placeholder, in
/// table units per second.
pub const MOVEMENT_SPEED: f32 = 600.0;

/// Per-card state on top of the playable base.
#[derive(Clone, Debug)]
pub struct CardState {
    /// Identity in the external card catalog.
    pub card: CardId,
    pub facedown: SyncField<bool>,
    /// Beginning a drag on this card spawns a fresh card that becomes the
    /// one actually dragged, leaving this one in place (template cards,
    /// cards dealt from a stack).
    pub clone_on_drag: bool,
    /// Assigned by the containing zone on add.
    pub default_action: Option<CardAction>,
    /// The card was released over a placeholder and is animating toward it.
    pub moving_to_placeholder: bool,
}

impl CardState {
    /// Create card state, face up.
    #[must_use]
    pub fn new(card: CardId) -> Self {
        Self {
            card,
            facedown: SyncField::new(false),
            clone_on_drag: false,
            default_action: None,
            moving_to_placeholder: false,
        }
    }

    /// Create card state with an explicit facing.
    #[must_use]
    pub fn with_facing(card: CardId, facedown: bool) -> Self {
        Self {
            facedown: SyncField::new(facedown),
            ..Self::new(card)
        }
    }

    /// Is the card currently face down?
    #[must_use]
    pub fn is_facedown(&self) -> bool {
        *self.facedown.get()
    }
}
