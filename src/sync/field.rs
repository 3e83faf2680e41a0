//! Replicated field: an observable cell with one canonical writer.
//!
//! The canonical value of each field lives with whichever participant holds
//! authority over the owning playable. Local writes mark the field dirty so
//! the table can push an update; inbound remote values are installed with
//! `apply_remote`, which never marks the field dirty. That asymmetry is the
//! echo guard: a non-authoritative participant can never re-broadcast a
//! value it just received.

/// A single replicated value.
///
/// The field itself does not know about authority; callers gate `set_local`
/// on holding it. What the field guarantees is the dirty-flag discipline:
/// only local writes produce outbound updates.
#[derive(Clone, Debug, Default)]
pub struct SyncField<T> {
    value: T,
    dirty: bool,
}

impl<T: Clone + PartialEq> SyncField<T> {
    /// Create a field with an initial value (clean).
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            dirty: false,
        }
    }

    /// The current value.
    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Originate a write. Marks the field dirty if the value changed.
    ///
    /// Returns whether the value changed.
    pub fn set_local(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.dirty = true;
        true
    }

    /// Install an inbound replicated value.
    ///
    /// Never marks the field dirty. Returns whether the value changed, so
    /// the caller can fire its change notification.
    pub fn apply_remote(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        // Any local write racing with this update has lost authority;
        // drop its pending broadcast.
        self.dirty = false;
        true
    }

    /// Is there a pending outbound update?
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Take the pending outbound value, if any, clearing the dirty flag.
    pub fn take_dirty(&mut self) -> Option<T> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.value.clone())
    }
}
