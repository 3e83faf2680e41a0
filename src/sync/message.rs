//! Wire model: requests flow client → host, updates flow host → everyone.
//!
//! The transport itself (encoding, delivery) is out of scope; these are the
//! values a reliable channel would carry. The host applies requests in
//! arrival order, which is what makes concurrent authority requests resolve
//! deterministically. Clients never originate state: they only apply
//! `Update`s, so stack and zone order converge verbatim on every
//! participant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{CardId, ParticipantId, PlayableId, Vec2};
use crate::sync::authority::WritePolicy;
use crate::table::counter::Color;
use crate::table::playable::PlayableSnapshot;

/// A mutation request sent to the host.
///
/// Each kind carries a write policy enforced host-side; a request that
/// fails its policy is logged and dropped, never an error to the sender.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Request {
    /// Claim exclusive write authority. First request wins; losing is silent.
    RequestAuthority { object: PlayableId },
    /// Give up authority. Only honored from the current holder.
    ReleaseAuthority { object: PlayableId },
    /// Host-forced reclaim (timeout, cleanup).
    ForceRelease { object: PlayableId },
    /// Bring a new playable into the shared scene. The spawner is granted
    /// authority over it.
    Spawn { snapshot: PlayableSnapshot },
    SetPosition { object: PlayableId, position: Vec2 },
    SetRotation { object: PlayableId, degrees: f32 },
    /// Face state is not a positional conflict: anyone may flip.
    SetFaceDown { object: PlayableId, facedown: bool },
    SetLabel { object: PlayableId, label: String },
    StackInsert {
        stack: PlayableId,
        index: usize,
        card: CardId,
    },
    StackRemoveAt { stack: PlayableId, index: usize },
    /// Ask the host to shuffle; the permutation is computed host-side only.
    StackShuffle { stack: PlayableId },
    DieRoll { die: PlayableId },
    DieSetValue { die: PlayableId, value: i32 },
    CounterSetValue { counter: PlayableId, value: i32 },
    CounterSetColor { counter: PlayableId, color: Color },
    /// Commit a drop: move the object into a container's child order
    /// (or out of all containers when `zone` is `None`).
    Reparent {
        object: PlayableId,
        zone: Option<PlayableId>,
        index: usize,
        position: Vec2,
    },
    /// Remove from play. Refused while another participant holds the object.
    Delete { object: PlayableId },
}

impl Request {
    /// The playable this request targets.
    #[must_use]
    pub fn object(&self) -> PlayableId {
        match self {
            Request::RequestAuthority { object }
            | Request::ReleaseAuthority { object }
            | Request::ForceRelease { object }
            | Request::SetPosition { object, .. }
            | Request::SetRotation { object, .. }
            | Request::SetFaceDown { object, .. }
            | Request::SetLabel { object, .. }
            | Request::Reparent { object, .. }
            | Request::Delete { object } => *object,
            Request::Spawn { snapshot } => snapshot.id,
            Request::StackInsert { stack, .. }
            | Request::StackRemoveAt { stack, .. }
            | Request::StackShuffle { stack } => *stack,
            Request::DieRoll { die } | Request::DieSetValue { die, .. } => *die,
            Request::CounterSetValue { counter, .. }
            | Request::CounterSetColor { counter, .. } => *counter,
        }
    }

    /// The write policy the host enforces for this request kind.
    ///
    /// Authority and delete requests carry their own arbitration rules and
    /// are tagged `Anyone` here; the arbiter decides.
    #[must_use]
    pub fn policy(&self) -> WritePolicy {
        match self {
            Request::RequestAuthority { .. }
            | Request::ReleaseAuthority { .. }
            | Request::Spawn { .. }
            | Request::SetFaceDown { .. }
            | Request::StackShuffle { .. }
            | Request::DieRoll { .. }
            | Request::DieSetValue { .. }
            | Request::CounterSetValue { .. }
            | Request::CounterSetColor { .. }
            | Request::Delete { .. } => WritePolicy::Anyone,
            Request::SetPosition { .. }
            | Request::SetRotation { .. }
            | Request::SetLabel { .. }
            | Request::StackInsert { .. }
            | Request::StackRemoveAt { .. }
            | Request::Reparent { .. } => WritePolicy::OwnerOnly,
            Request::ForceRelease { .. } => WritePolicy::HostOnly,
        }
    }
}

/// A replicated state change broadcast by the host.
///
/// Updates for one playable are delivered in the order they were produced;
/// there is no cross-playable ordering guarantee.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Update {
    Spawned { snapshot: PlayableSnapshot },
    AuthorityChanged {
        object: PlayableId,
        holder: Option<ParticipantId>,
    },
    Position { object: PlayableId, position: Vec2 },
    Rotation { object: PlayableId, degrees: f32 },
    FaceDown { object: PlayableId, facedown: bool },
    Label { object: PlayableId, label: String },
    StackInserted {
        stack: PlayableId,
        index: usize,
        card: CardId,
    },
    StackRemoved { stack: PlayableId, index: usize },
    /// Full order refresh (how a shuffle replicates).
    StackOrder {
        stack: PlayableId,
        cards: Vec<CardId>,
    },
    DieValue { die: PlayableId, value: i32 },
    CounterValue { counter: PlayableId, value: i32 },
    CounterColor { counter: PlayableId, color: Color },
    Reparented {
        object: PlayableId,
        zone: Option<PlayableId>,
        index: usize,
        position: Vec2,
    },
    Removed { object: PlayableId },
}

/// Why the host refused a request.
///
/// None of these propagate to the sender as failures; the host logs the
/// rejection and drops the request (availability over strictness).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Rejection {
    #[error("{sender} is not authorized to mutate {object}")]
    NotAuthorized {
        object: PlayableId,
        sender: ParticipantId,
    },
    #[error("{object} is held by {holder}")]
    HeldByOther {
        object: PlayableId,
        holder: ParticipantId,
    },
    #[error("unknown playable {object}")]
    UnknownPlayable { object: PlayableId },
    #[error("{object} already exists, cannot spawn")]
    SpawnCollision { object: PlayableId },
    #[error("{object} is not the right kind of playable for this request")]
    WrongKind { object: PlayableId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_tags() {
        let object = PlayableId(1);

        assert_eq!(
            Request::SetPosition {
                object,
                position: Vec2::ZERO
            }
            .policy(),
            WritePolicy::OwnerOnly
        );
        assert_eq!(
            Request::SetFaceDown {
                object,
                facedown: true
            }
            .policy(),
            WritePolicy::Anyone
        );
        assert_eq!(
            Request::ForceRelease { object }.policy(),
            WritePolicy::HostOnly
        );
        assert_eq!(
            Request::CounterSetValue {
                counter: object,
                value: 1
            }
            .policy(),
            WritePolicy::Anyone
        );
        assert_eq!(
            Request::StackInsert {
                stack: object,
                index: 0,
                card: CardId::new(1)
            }
            .policy(),
            WritePolicy::OwnerOnly
        );
    }

    #[test]
    fn test_target_object() {
        let stack = PlayableId(3);
        assert_eq!(Request::StackShuffle { stack }.object(), stack);
        assert_eq!(
            Request::Delete { object: stack }.object(),
            stack
        );
    }

    #[test]
    fn test_request_serde_round_trip() {
        let req = Request::StackInsert {
            stack: PlayableId(7),
            index: 2,
            card: CardId::new(11),
        };

        let json = serde_json::to_string(&req).unwrap();
        let back: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(req, back);
    }
}
