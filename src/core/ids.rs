//! Identifier newtypes for playables, participants, pointers, and cards.
//!
//! Every object on the table ("playable") has a `PlayableId`. Ids are
//! allocated from a per-participant namespace so that any participant can
//! spawn a playable (clone-on-drag, drag-from-stack) without a round-trip
//! to the host for id assignment:
//!
//! - high 8 bits: spawning participant
//! - low 24 bits: per-participant sequence counter

use serde::{Deserialize, Serialize};

/// Unique identifier for any playable on the table.
///
/// Cards, stacks, zones, dice, counters, and tokens all have PlayableIds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayableId(pub u32);

impl PlayableId {
    /// Build an id in `participant`'s namespace.
    #[must_use]
    pub const fn new(participant: ParticipantId, sequence: u32) -> Self {
        Self(((participant.0 as u32) << 24) | (sequence & 0x00FF_FFFF))
    }

    /// The participant whose namespace this id was allocated from.
    #[must_use]
    pub const fn spawner(self) -> ParticipantId {
        ParticipantId((self.0 >> 24) as u8)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PlayableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Playable({})", self.0)
    }
}

/// A participant in the shared session.
///
/// One participant is distinguished as the host and arbitrates authority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub u8);

impl ParticipantId {
    /// Create a participant id.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Participant({})", self.0)
    }
}

/// Identifier of one active pointer (mouse button, touch finger).
///
/// Values come straight from the embedding input source; the table only
/// compares them for equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerId(pub i32);

impl std::fmt::Display for PointerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pointer({})", self.0)
    }
}

/// Identity of a card in the external, read-only catalog.
///
/// `CardId::BLANK` is the sentinel returned by out-of-range container reads
/// and used when a catalog lookup fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// The blank sentinel card.
    pub const BLANK: CardId = CardId(0);

    /// Create a card id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Is this the blank sentinel?
    #[must_use]
    pub const fn is_blank(self) -> bool {
        self.0 == Self::BLANK.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}
