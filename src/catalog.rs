//! Card catalog: read-only lookup of card display metadata.
//!
//! The catalog is an external collaborator. The table never mutates it and
//! never fails when an identity is missing: unknown ids resolve to the blank
//! card with a logged warning, so a stale or mid-download catalog degrades
//! to blank faces instead of failing operations.

use log::warn;
use rustc_hash::FxHashMap;

use crate::core::CardId;

/// Display metadata for one card.
#[derive(Clone, Debug, PartialEq)]
pub struct CardInfo {
    pub id: CardId,
    pub name: String,
    /// Game-specific display properties (set code, cost, image key, ...).
    pub properties: FxHashMap<String, String>,
}

impl CardInfo {
    /// Create a card entry.
    pub fn new(id: CardId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            properties: FxHashMap::default(),
        }
    }

    /// Add a display property (builder style).
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The blank card every failed lookup resolves to.
    #[must_use]
    pub fn blank() -> Self {
        Self::new(CardId::BLANK, "")
    }
}

/// Registry of card metadata.
///
/// ## Example
///
/// ```
/// use cardtable::catalog::{CardCatalog, CardInfo};
/// use cardtable::core::CardId;
///
/// let mut catalog = CardCatalog::new();
/// catalog.register(CardInfo::new(CardId::new(1), "Lightning Bolt"));
///
/// assert_eq!(catalog.lookup(CardId::new(1)).name, "Lightning Bolt");
/// // Unknown ids fall back to the blank card rather than failing.
/// assert!(catalog.lookup(CardId::new(99)).name.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct CardCatalog {
    cards: FxHashMap<CardId, CardInfo>,
    blank: CardInfo,
}

impl Default for CardCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CardCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cards: FxHashMap::default(),
            blank: CardInfo::blank(),
        }
    }

    /// Register a card entry.
    ///
    /// Panics if the id is already registered or is the blank sentinel.
    pub fn register(&mut self, card: CardInfo) {
        assert!(!card.id.is_blank(), "Cannot register the blank sentinel");
        if self.cards.contains_key(&card.id) {
            panic!("Card {} already registered", card.id);
        }
        self.cards.insert(card.id, card);
    }

    /// Get a card entry, or `None` if unknown.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&CardInfo> {
        self.cards.get(&id)
    }

    /// Resolve a card identity for display.
    ///
    /// Unknown or blank ids resolve to the blank card; unknown ids also log
    /// a recoverable warning.
    #[must_use]
    pub fn lookup(&self, id: CardId) -> &CardInfo {
        if id.is_blank() {
            return &self.blank;
        }
        match self.cards.get(&id) {
            Some(info) => info,
            None => {
                warn!("unknown card identity {id}, falling back to blank");
                &self.blank
            }
        }
    }

    /// Is this id registered?
    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.cards.contains_key(&id)
    }

    /// Number of registered cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Is the catalog empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = &CardInfo> {
        self.cards.values()
    }
}
