//! Stack container: an ordered, authority-gated list of card identities.
//!
//! All mutation goes through the host (or the authority holder); the
//! resulting order replicates verbatim, so every participant converges on
//! the same list without recomputing anything locally. Out-of-range reads
//! return the blank sentinel rather than failing: concurrent removals
//! racing with a read are expected.

use crate::core::{CardId, TableRng};
use crate::sync::SyncField;

/// Per-stack state on top of the playable base.
#[derive(Clone, Debug)]
pub struct StackState {
    pub label: SyncField<String>,
    cards: Vec<CardId>,
    /// Table clock timestamp of the last shuffle, for UI flashes.
    pub last_shuffle_at: Option<f32>,
}

impl StackState {
    /// Create a stack. Index 0 is the bottom; the last entry is the top.
    #[must_use]
    pub fn new(label: impl Into<String>, cards: Vec<CardId>) -> Self {
        Self {
            label: SyncField::new(label.into()),
            cards,
            last_shuffle_at: None,
        }
    }

    /// The ordered card identities, bottom to top.
    #[must_use]
    pub fn cards(&self) -> &[CardId] {
        &self.cards
    }

    /// Number of cards in the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Is the stack empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The top card, if any.
    #[must_use]
    pub fn top(&self) -> Option<CardId> {
        self.cards.last().copied()
    }

    /// Insert a card. The index is clamped into range; returns the index
    /// actually used.
    pub fn insert(&mut self, index: usize, card: CardId) -> usize {
        let index = index.min(self.cards.len());
        self.cards.insert(index, card);
        index
    }

    /// Remove and return the card at `index`.
    ///
    /// Returns the blank sentinel when the index is out of range.
    pub fn remove_at(&mut self, index: usize) -> CardId {
        if index >= self.cards.len() {
            return CardId::BLANK;
        }
        self.cards.remove(index)
    }

    /// Shuffle in place with the host RNG (uniform permutation).
    ///
    /// Only the authoritative side ever calls this; observers receive the
    /// result as a full order refresh.
    pub fn shuffle(&mut self, rng: &mut TableRng) {
        rng.shuffle(&mut self.cards);
    }

    /// Install a replicated full order refresh.
    pub fn replace_all(&mut self, cards: Vec<CardId>) {
        self.cards = cards;
    }
}
