//! The playable base: everything that sits on the shared table.
//!
//! Cards, stacks, zones, dice, and tokens share a replicated base (position,
//! rotation, containing zone, authority holder) plus local-only interaction
//! state (drag tracking, highlight). The kind-specific state hangs off an
//! enum rather than a trait object so the table can store everything in one
//! arena and match on kind at the call sites that care.
//!
//! ## Snapshots
//!
//! A [`PlayableSnapshot`] is the serializable replicated subset, used to
//! spawn a playable on every participant. Local-only state never crosses
//! the wire: a freshly spawned remote copy starts with an idle drag tracker
//! and no highlight.

use serde::{Deserialize, Serialize};

use crate::core::{CardId, ParticipantId, PlayableId, Rect, Vec2};
use crate::input::{DragTracker, HighlightMode};
use crate::sync::SyncField;
use crate::table::card::{CardAction, CardState};
use crate::table::counter::{Color, CounterState};
use crate::table::die::DieState;
use crate::table::stack::StackState;
use crate::table::zone::{FacePreference, ZoneLayout, ZoneState};

/// Kind-specific state of a playable.
#[derive(Clone, Debug)]
pub enum PlayableKind {
    Card(CardState),
    Stack(StackState),
    Zone(ZoneState),
    Die(DieState),
    Counter(CounterState),
    /// A plain marker with no extra state beyond the base.
    Token,
}

/// One object on the shared table.
#[derive(Clone, Debug)]
pub struct Playable {
    pub id: PlayableId,
    pub position: SyncField<Vec2>,
    /// Z-axis rotation in degrees.
    pub rotation: SyncField<f32>,
    /// Current authority holder, mirrored from the host's arbiter.
    pub holder: Option<ParticipantId>,
    /// A remote participant has held this playable at some point; drives
    /// the "someone else touched this" tint.
    pub foreign_touched: bool,
    /// The zone containing this playable, if any.
    pub zone: Option<PlayableId>,
    pub drag: DragTracker,
    pub highlight: HighlightMode,
    pub kind: PlayableKind,
}

impl Playable {
    /// Create a playable at a position.
    #[must_use]
    pub fn new(id: PlayableId, position: Vec2, kind: PlayableKind) -> Self {
        Self {
            id,
            position: SyncField::new(position),
            rotation: SyncField::new(0.0),
            holder: None,
            foreign_touched: false,
            zone: None,
            drag: DragTracker::new(),
            highlight: HighlightMode::Off,
            kind,
        }
    }

    /// Current position.
    #[must_use]
    pub fn pos(&self) -> Vec2 {
        *self.position.get()
    }

    /// Does `local` lack write authority over this playable?
    #[must_use]
    pub fn lacks_authority(&self, local: ParticipantId) -> bool {
        self.holder != Some(local)
    }

    /// Is this playable currently held by someone other than `local`?
    #[must_use]
    pub fn is_foreign_held(&self, local: ParticipantId) -> bool {
        matches!(self.holder, Some(h) if h != local)
    }

    /// Drop-region bounds, for zones.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        match &self.kind {
            PlayableKind::Zone(zone) => Some(Rect::new(self.pos(), zone.size)),
            _ => None,
        }
    }

    pub fn as_card(&self) -> Option<&CardState> {
        match &self.kind {
            PlayableKind::Card(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_card_mut(&mut self) -> Option<&mut CardState> {
        match &mut self.kind {
            PlayableKind::Card(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_stack(&self) -> Option<&StackState> {
        match &self.kind {
            PlayableKind::Stack(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_stack_mut(&mut self) -> Option<&mut StackState> {
        match &mut self.kind {
            PlayableKind::Stack(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_zone(&self) -> Option<&ZoneState> {
        match &self.kind {
            PlayableKind::Zone(z) => Some(z),
            _ => None,
        }
    }

    pub fn as_zone_mut(&mut self) -> Option<&mut ZoneState> {
        match &mut self.kind {
            PlayableKind::Zone(z) => Some(z),
            _ => None,
        }
    }

    pub fn as_die(&self) -> Option<&DieState> {
        match &self.kind {
            PlayableKind::Die(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_die_mut(&mut self) -> Option<&mut DieState> {
        match &mut self.kind {
            PlayableKind::Die(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_counter(&self) -> Option<&CounterState> {
        match &self.kind {
            PlayableKind::Counter(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_counter_mut(&mut self) -> Option<&mut CounterState> {
        match &mut self.kind {
            PlayableKind::Counter(c) => Some(c),
            _ => None,
        }
    }

    /// The replicated subset, for spawning on other participants.
    #[must_use]
    pub fn snapshot(&self) -> PlayableSnapshot {
        let kind = match &self.kind {
            PlayableKind::Card(c) => SnapshotKind::Card {
                card: c.card,
                facedown: c.is_facedown(),
                clone_on_drag: c.clone_on_drag,
            },
            PlayableKind::Stack(s) => SnapshotKind::Stack {
                label: s.label.get().clone(),
                cards: s.cards().to_vec(),
            },
            PlayableKind::Zone(z) => SnapshotKind::Zone {
                layout: z.layout,
                size: z.size,
                face_preference: z.face_preference,
                default_action: z.default_action,
                immediate_release: z.immediate_release,
                scrollable: z.scrollable,
            },
            PlayableKind::Die(d) => SnapshotKind::Die {
                min: d.min,
                max: d.max,
                value: d.current(),
            },
            PlayableKind::Counter(c) => SnapshotKind::Counter {
                value: c.current(),
                color: *c.color.get(),
            },
            PlayableKind::Token => SnapshotKind::Token,
        };
        PlayableSnapshot {
            id: self.id,
            position: self.pos(),
            rotation_degrees: *self.rotation.get(),
            zone: self.zone,
            kind,
        }
    }

    /// Reconstruct a playable from a replicated snapshot.
    ///
    /// Zone membership carried by the snapshot is installed on the playable;
    /// the table is responsible for the matching child-list entry.
    #[must_use]
    pub fn from_snapshot(snapshot: PlayableSnapshot) -> Self {
        let kind = match snapshot.kind {
            SnapshotKind::Card {
                card,
                facedown,
                clone_on_drag,
            } => {
                let mut state = CardState::with_facing(card, facedown);
                state.clone_on_drag = clone_on_drag;
                PlayableKind::Card(state)
            }
            SnapshotKind::Stack { label, cards } => {
                PlayableKind::Stack(StackState::new(label, cards))
            }
            SnapshotKind::Zone {
                layout,
                size,
                face_preference,
                default_action,
                immediate_release,
                scrollable,
            } => {
                let mut state = ZoneState::new(layout, size);
                state.face_preference = face_preference;
                state.default_action = default_action;
                state.immediate_release = immediate_release;
                state.scrollable = scrollable;
                PlayableKind::Zone(state)
            }
            SnapshotKind::Die { min, max, value } => {
                let mut state = DieState::new(min, max);
                state.value.apply_remote(value);
                PlayableKind::Die(state)
            }
            SnapshotKind::Counter { value, color } => {
                let mut state = CounterState::new(value);
                state.color.apply_remote(color);
                PlayableKind::Counter(state)
            }
            SnapshotKind::Token => PlayableKind::Token,
        };
        let mut playable = Playable::new(snapshot.id, snapshot.position, kind);
        playable.rotation.apply_remote(snapshot.rotation_degrees);
        playable.zone = snapshot.zone;
        playable
    }
}

/// The replicated subset of a playable's state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayableSnapshot {
    pub id: PlayableId,
    pub position: Vec2,
    pub rotation_degrees: f32,
    pub zone: Option<PlayableId>,
    pub kind: SnapshotKind,
}

/// Kind-specific replicated state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SnapshotKind {
    Card {
        card: CardId,
        facedown: bool,
        clone_on_drag: bool,
    },
    Stack {
        label: String,
        cards: Vec<CardId>,
    },
    Zone {
        layout: ZoneLayout,
        size: Vec2,
        face_preference: FacePreference,
        default_action: Option<CardAction>,
        immediate_release: bool,
        scrollable: bool,
    },
    Die {
        min: i32,
        max: i32,
        value: i32,
    },
    Counter {
        value: i32,
        color: Color,
    },
    Token,
}
