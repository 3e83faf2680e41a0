//! Authority arbitration: one writer per playable, mediated by the host.
//!
//! The arbiter is host-side state. Requests arrive in transport order and
//! the first request for an unclaimed playable wins; a losing request is
//! silently ignored (no queue, no retry signal). Release is only honored
//! from the current holder and is idempotent. A disconnecting participant
//! has everything it held force-released so no playable stays stuck.

use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{ParticipantId, PlayableId};

/// Who may send a given request kind. Enforced by the arbitrating side,
/// never trusted from the sender.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WritePolicy {
    /// Any participant (face flips, die rolls, shuffle requests).
    Anyone,
    /// Only the current authority holder, or the host force-mutating.
    OwnerOnly,
    /// Only the host (force-release, timeout reclaim).
    HostOnly,
}

impl WritePolicy {
    /// Does this policy permit `sender` to act on a playable currently held
    /// by `holder`, with `host` arbitrating?
    #[must_use]
    pub fn permits(
        self,
        sender: ParticipantId,
        holder: Option<ParticipantId>,
        host: ParticipantId,
    ) -> bool {
        match self {
            WritePolicy::Anyone => true,
            WritePolicy::OwnerOnly => holder == Some(sender) || sender == host,
            WritePolicy::HostOnly => sender == host,
        }
    }
}

/// Host-side record of which participant holds each playable.
///
/// Unregistered playables are simply unheld; the arbiter does not require
/// registration before a request.
#[derive(Clone, Debug, Default)]
pub struct AuthorityArbiter {
    holders: FxHashMap<PlayableId, ParticipantId>,
}

impl AuthorityArbiter {
    /// Create an arbiter with nothing claimed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an authority request. First request wins.
    ///
    /// Returns `true` when `requester` now holds the playable (including
    /// the idempotent case where it already did). A losing request returns
    /// `false` and has no other effect.
    pub fn request(&mut self, object: PlayableId, requester: ParticipantId) -> bool {
        match self.holders.get(&object) {
            None => {
                self.holders.insert(object, requester);
                true
            }
            Some(&holder) if holder == requester => true,
            Some(&holder) => {
                debug!("{requester} lost authority race for {object} (held by {holder})");
                false
            }
        }
    }

    /// Release authority. Only the current holder may release; releasing
    /// something not held is a no-op.
    ///
    /// Returns whether the playable became unclaimed.
    pub fn release(&mut self, object: PlayableId, participant: ParticipantId) -> bool {
        match self.holders.get(&object) {
            Some(&holder) if holder == participant => {
                self.holders.remove(&object);
                true
            }
            Some(&holder) => {
                debug!("{participant} tried to release {object} held by {holder}");
                false
            }
            None => false,
        }
    }

    /// Host-forced release regardless of holder (timeout, cleanup).
    ///
    /// Returns the previous holder, if any.
    pub fn force_release(&mut self, object: PlayableId) -> Option<ParticipantId> {
        self.holders.remove(&object)
    }

    /// Release everything `participant` holds (disconnect cleanup).
    ///
    /// Returns the playables that became unclaimed.
    pub fn force_release_all(&mut self, participant: ParticipantId) -> Vec<PlayableId> {
        let released: Vec<PlayableId> = self
            .holders
            .iter()
            .filter(|(_, &p)| p == participant)
            .map(|(&id, _)| id)
            .collect();
        for id in &released {
            self.holders.remove(id);
        }
        released
    }

    /// Drop all record of a playable (despawn).
    pub fn forget(&mut self, object: PlayableId) {
        self.holders.remove(&object);
    }

    /// The current holder of a playable.
    #[must_use]
    pub fn holder(&self, object: PlayableId) -> Option<ParticipantId> {
        self.holders.get(&object).copied()
    }

    /// Is the playable claimed by anyone?
    #[must_use]
    pub fn is_held(&self, object: PlayableId) -> bool {
        self.holders.contains_key(&object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: u8) -> ParticipantId {
        ParticipantId::new(id)
    }

    fn obj(id: u32) -> PlayableId {
        PlayableId(id)
    }

    #[test]
    fn test_first_request_wins() {
        let mut arbiter = AuthorityArbiter::new();

        assert!(arbiter.request(obj(1), p(1)));
        assert!(!arbiter.request(obj(1), p(2)));
        assert_eq!(arbiter.holder(obj(1)), Some(p(1)));
    }

    #[test]
    fn test_request_is_idempotent_for_holder() {
        let mut arbiter = AuthorityArbiter::new();

        assert!(arbiter.request(obj(1), p(1)));
        assert!(arbiter.request(obj(1), p(1)));
        assert_eq!(arbiter.holder(obj(1)), Some(p(1)));
    }

    #[test]
    fn test_release_only_by_holder() {
        let mut arbiter = AuthorityArbiter::new();
        arbiter.request(obj(1), p(1));

        assert!(!arbiter.release(obj(1), p(2)));
        assert_eq!(arbiter.holder(obj(1)), Some(p(1)));

        assert!(arbiter.release(obj(1), p(1)));
        assert!(!arbiter.is_held(obj(1)));
    }

    #[test]
    fn test_release_unheld_is_noop() {
        let mut arbiter = AuthorityArbiter::new();
        assert!(!arbiter.release(obj(1), p(1)));
    }

    #[test]
    fn test_claim_after_release() {
        let mut arbiter = AuthorityArbiter::new();
        arbiter.request(obj(1), p(1));
        arbiter.release(obj(1), p(1));

        assert!(arbiter.request(obj(1), p(2)));
        assert_eq!(arbiter.holder(obj(1)), Some(p(2)));
    }

    #[test]
    fn test_force_release_all() {
        let mut arbiter = AuthorityArbiter::new();
        arbiter.request(obj(1), p(1));
        arbiter.request(obj(2), p(1));
        arbiter.request(obj(3), p(2));

        let mut released = arbiter.force_release_all(p(1));
        released.sort_by_key(|o| o.0);

        assert_eq!(released, vec![obj(1), obj(2)]);
        assert!(!arbiter.is_held(obj(1)));
        assert!(!arbiter.is_held(obj(2)));
        assert_eq!(arbiter.holder(obj(3)), Some(p(2)));
    }

    #[test]
    fn test_write_policy() {
        let host = p(0);

        assert!(WritePolicy::Anyone.permits(p(2), Some(p(1)), host));

        assert!(WritePolicy::OwnerOnly.permits(p(1), Some(p(1)), host));
        assert!(!WritePolicy::OwnerOnly.permits(p(2), Some(p(1)), host));
        assert!(!WritePolicy::OwnerOnly.permits(p(2), None, host));
        // Host may force-mutate
        assert!(WritePolicy::OwnerOnly.permits(host, Some(p(1)), host));

        assert!(WritePolicy::HostOnly.permits(host, None, host));
        assert!(!WritePolicy::HostOnly.permits(p(1), None, host));
    }
}
