//! The shared table: one participant's replica of the whole scene.
//!
//! Every participant runs a `Table`. Local interaction (pointer gestures,
//! convenience operations) produces [`Request`]s; the host participant feeds
//! inbound requests through [`Table::host_apply`], which validates them
//! against write policy and the authority arbiter and turns accepted ones
//! into [`Update`]s. Clients feed inbound updates through
//! [`Table::apply_update`]. Both sides mutate replicated state through the
//! same internal application path, so host and clients converge on
//! identical scenes.
//!
//! ## Prediction
//!
//! Position and rotation are locally predicted while the local participant
//! holds authority: the holder moves the playable immediately and skips the
//! host's echo. Container order, face state, and die values are never
//! predicted; they change only when the host's update arrives, on every
//! participant alike.
//!
//! ## Drops
//!
//! Releasing a drag over a zone records a placeholder; the playable then
//! glides toward it at a fixed speed and commits membership on arrival.
//! Releasing over empty table space discards the playable.

use log::warn;
use rustc_hash::FxHashMap;

use crate::catalog::CardCatalog;
use crate::core::{CardId, ParticipantId, PlayableId, PointerId, TableRng, Vec2};
use crate::input::{DragPhase, HighlightMode};
use crate::sync::{AuthorityArbiter, Rejection, Request, Update};
use crate::table::card::{CardState, MOVEMENT_SPEED};
use crate::table::counter::{Color, CounterState};
use crate::table::die::DieState;
use crate::table::playable::{Playable, PlayableKind};
use crate::table::stack::StackState;
use crate::table::zone::{insertion_index, FacePreference, ZoneState};

/// Tunable interaction parameters.
#[derive(Clone, Copy, Debug)]
pub struct TableConfig {
    /// Seconds a pointer must rest on a playable to request a preview.
    pub hold_preview_secs: f32,
    /// Glide speed toward a placeholder, table units per second.
    pub movement_speed: f32,
    /// Distance at which a gliding playable is considered arrived.
    pub arrive_epsilon: f32,
    /// Holding a single pointer on a stack at least this long drags the
    /// whole stack instead of its top card.
    pub stack_drag_hold_secs: f32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            hold_preview_secs: 0.5,
            movement_speed: MOVEMENT_SPEED,
            arrive_epsilon: 1.0,
            stack_drag_hold_secs: 0.5,
        }
    }
}

/// Whether this replica arbitrates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableRole {
    Host,
    Client,
}

/// Notifications for the embedding layer (rendering, sound, game logic).
#[derive(Clone, Debug, PartialEq)]
pub enum TableEvent {
    AddedToZone { zone: PlayableId, child: PlayableId },
    RemovedFromZone { zone: PlayableId, child: PlayableId },
    /// The playable left play (empty-space drop or explicit delete).
    Discarded { object: PlayableId },
    /// A drag over a scrollable list should scroll the list instead of
    /// moving anything.
    ScrollForwarded {
        zone: PlayableId,
        phase: DragPhase,
        pointer: PointerId,
    },
    /// A pointer rested long enough to warrant a zoomed preview.
    PreviewRequested { object: PlayableId },
}

/// A pending drop target recorded while dragging.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaceHolder {
    pub zone: PlayableId,
    pub index: usize,
    pub position: Vec2,
}

/// One participant's replica of the shared scene.
pub struct Table {
    role: TableRole,
    local: ParticipantId,
    host: ParticipantId,
    playables: FxHashMap<PlayableId, Playable>,
    /// Spawn order doubles as draw order; the last spawned is topmost for
    /// hit testing.
    spawn_order: Vec<PlayableId>,
    arbiter: AuthorityArbiter,
    catalog: CardCatalog,
    rng: TableRng,
    clock: f32,
    next_seq: u32,
    outbound: Vec<Request>,
    updates: Vec<Update>,
    events: Vec<TableEvent>,
    placeholders: FxHashMap<PlayableId, PlaceHolder>,
    config: TableConfig,
}

impl Table {
    /// Create the hosting replica. The seed drives shuffles and die rolls.
    #[must_use]
    pub fn host(local: ParticipantId, catalog: CardCatalog, seed: u64) -> Self {
        Self::new(TableRole::Host, local, local, catalog, seed)
    }

    /// Create a client replica pointed at `host`.
    #[must_use]
    pub fn client(local: ParticipantId, host: ParticipantId, catalog: CardCatalog) -> Self {
        // Clients never randomize; the seed is inert.
        Self::new(TableRole::Client, local, host, catalog, 0)
    }

    fn new(
        role: TableRole,
        local: ParticipantId,
        host: ParticipantId,
        catalog: CardCatalog,
        seed: u64,
    ) -> Self {
        Self {
            role,
            local,
            host,
            playables: FxHashMap::default(),
            spawn_order: Vec::new(),
            arbiter: AuthorityArbiter::new(),
            catalog,
            rng: TableRng::new(seed),
            clock: 0.0,
            next_seq: 0,
            outbound: Vec::new(),
            updates: Vec::new(),
            events: Vec::new(),
            placeholders: FxHashMap::default(),
            config: TableConfig::default(),
        }
    }

    /// Override the interaction parameters.
    pub fn set_config(&mut self, config: TableConfig) {
        self.config = config;
    }

    // ----- accessors ------------------------------------------------------

    #[must_use]
    pub fn local(&self) -> ParticipantId {
        self.local
    }

    #[must_use]
    pub fn is_host(&self) -> bool {
        self.role == TableRole::Host
    }

    #[must_use]
    pub fn clock(&self) -> f32 {
        self.clock
    }

    #[must_use]
    pub fn get(&self, object: PlayableId) -> Option<&Playable> {
        self.playables.get(&object)
    }

    /// The mirrored authority holder of a playable.
    #[must_use]
    pub fn holder(&self, object: PlayableId) -> Option<ParticipantId> {
        self.playables.get(&object).and_then(|p| p.holder)
    }

    #[must_use]
    pub fn placeholder(&self, object: PlayableId) -> Option<&PlaceHolder> {
        self.placeholders.get(&object)
    }

    #[must_use]
    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    /// Number of playables on the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.playables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.playables.is_empty()
    }

    /// Requests queued for the host. The embedding drains and delivers them.
    pub fn drain_outbound(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outbound)
    }

    /// Updates queued for broadcast (host only).
    pub fn drain_updates(&mut self) -> Vec<Update> {
        std::mem::take(&mut self.updates)
    }

    /// Notifications for the embedding layer.
    pub fn drain_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }

    /// Short description of a playable for tooltips and accessibility.
    ///
    /// Face-down cards never leak their identity.
    #[must_use]
    pub fn view_value(&self, object: PlayableId) -> String {
        let Some(p) = self.playables.get(&object) else {
            return String::new();
        };
        match &p.kind {
            PlayableKind::Card(c) => {
                if c.is_facedown() {
                    "Face-down card".to_string()
                } else {
                    self.catalog.lookup(c.card).name.clone()
                }
            }
            PlayableKind::Stack(s) => format!("{} ({})", s.label.get(), s.len()),
            PlayableKind::Zone(z) => format!("Zone ({})", z.len()),
            PlayableKind::Die(d) => format!("Value: {}", d.current()),
            PlayableKind::Counter(c) => format!("Count: {}", c.current()),
            PlayableKind::Token => "Token".to_string(),
        }
    }

    // ----- spawning -------------------------------------------------------

    fn alloc_id(&mut self) -> PlayableId {
        self.next_seq += 1;
        PlayableId::new(self.local, self.next_seq)
    }

    /// Insert locally and request replication. Ids come from the local
    /// participant's namespace, so no round-trip is needed before the
    /// playable is usable.
    fn spawn(&mut self, position: Vec2, kind: PlayableKind) -> PlayableId {
        let id = self.alloc_id();
        let playable = Playable::new(id, position, kind);
        self.outbound.push(Request::Spawn {
            snapshot: playable.snapshot(),
        });
        self.playables.insert(id, playable);
        self.spawn_order.push(id);
        id
    }

    pub fn spawn_card(&mut self, card: CardId, position: Vec2) -> PlayableId {
        self.spawn(position, PlayableKind::Card(CardState::new(card)))
    }

    pub fn spawn_stack(
        &mut self,
        label: impl Into<String>,
        cards: Vec<CardId>,
        position: Vec2,
    ) -> PlayableId {
        self.spawn(position, PlayableKind::Stack(StackState::new(label, cards)))
    }

    pub fn spawn_zone(&mut self, zone: ZoneState, position: Vec2) -> PlayableId {
        self.spawn(position, PlayableKind::Zone(zone))
    }

    pub fn spawn_die(&mut self, min: i32, max: i32, position: Vec2) -> PlayableId {
        self.spawn(position, PlayableKind::Die(DieState::new(min, max)))
    }

    pub fn spawn_counter(&mut self, value: i32, position: Vec2) -> PlayableId {
        self.spawn(position, PlayableKind::Counter(CounterState::new(value)))
    }

    pub fn spawn_token(&mut self, position: Vec2) -> PlayableId {
        self.spawn(position, PlayableKind::Token)
    }

    // ----- convenience operations ----------------------------------------

    pub fn request_authority(&mut self, object: PlayableId) {
        self.outbound.push(Request::RequestAuthority { object });
    }

    pub fn release_authority(&mut self, object: PlayableId) {
        self.outbound.push(Request::ReleaseAuthority { object });
    }

    /// Toggle a card's facing.
    pub fn flip_card(&mut self, card: PlayableId) {
        if let Some(facedown) = self
            .playables
            .get(&card)
            .and_then(|p| p.as_card())
            .map(CardState::is_facedown)
        {
            self.outbound.push(Request::SetFaceDown {
                object: card,
                facedown: !facedown,
            });
        }
    }

    /// Set rotation, predicted locally while holding authority.
    pub fn rotate_to(&mut self, object: PlayableId, degrees: f32) {
        if let Some(p) = self.playables.get_mut(&object) {
            if p.holder == Some(self.local) {
                p.rotation.set_local(degrees);
                let _ = p.rotation.take_dirty();
            }
        }
        self.outbound.push(Request::SetRotation { object, degrees });
    }

    pub fn set_stack_label(&mut self, stack: PlayableId, label: impl Into<String>) {
        self.outbound.push(Request::SetLabel {
            object: stack,
            label: label.into(),
        });
    }

    pub fn insert_into_stack(&mut self, stack: PlayableId, index: usize, card: CardId) {
        self.outbound.push(Request::StackInsert { stack, index, card });
    }

    pub fn shuffle_stack(&mut self, stack: PlayableId) {
        self.outbound.push(Request::StackShuffle { stack });
    }

    pub fn roll_die(&mut self, die: PlayableId) {
        self.outbound.push(Request::DieRoll { die });
    }

    pub fn set_die_value(&mut self, die: PlayableId, value: i32) {
        self.outbound.push(Request::DieSetValue { die, value });
    }

    /// Step a die up by one, wrapping at its bounds.
    pub fn increment_die(&mut self, die: PlayableId) {
        if let Some(value) = self
            .playables
            .get(&die)
            .and_then(|p| p.as_die())
            .map(|d| d.incremented())
        {
            self.set_die_value(die, value);
        }
    }

    /// Step a die down by one, wrapping at its bounds.
    pub fn decrement_die(&mut self, die: PlayableId) {
        if let Some(value) = self
            .playables
            .get(&die)
            .and_then(|p| p.as_die())
            .map(|d| d.decremented())
        {
            self.set_die_value(die, value);
        }
    }

    pub fn set_counter_value(&mut self, counter: PlayableId, value: i32) {
        self.outbound.push(Request::CounterSetValue { counter, value });
    }

    /// Bump a counter by a signed delta.
    pub fn adjust_counter(&mut self, counter: PlayableId, delta: i32) {
        if let Some(value) = self
            .playables
            .get(&counter)
            .and_then(Playable::as_counter)
            .map(|c| c.current() + delta)
        {
            self.set_counter_value(counter, value);
        }
    }

    pub fn set_counter_color(&mut self, counter: PlayableId, color: Color) {
        self.outbound.push(Request::CounterSetColor { counter, color });
    }

    pub fn delete(&mut self, object: PlayableId) {
        self.outbound.push(Request::Delete { object });
    }

    /// Host-side disconnect cleanup: everything the participant held is
    /// force-released so no playable stays stuck.
    pub fn disconnect(&mut self, participant: ParticipantId) {
        if self.role != TableRole::Host {
            return;
        }
        for object in self.arbiter.force_release_all(participant) {
            self.broadcast(Update::AuthorityChanged {
                object,
                holder: None,
            });
        }
    }

    // ----- pointer gestures -----------------------------------------------

    /// A pointer pressed on a playable.
    pub fn pointer_down(&mut self, object: PlayableId, pointer: PointerId, position: Vec2) {
        if let Some(p) = self.playables.get_mut(&object) {
            let object_pos = p.pos();
            p.drag.pointer_down(pointer, position, object_pos);
            if p.highlight == HighlightMode::Off {
                p.highlight = HighlightMode::Selected;
            }
        }
    }

    /// A pointer released without a drag in flight.
    pub fn pointer_up(&mut self, object: PlayableId, pointer: PointerId) {
        if let Some(p) = self.playables.get_mut(&object) {
            p.drag.pointer_up(pointer);
            if p.drag.active_pointers() == 0 && p.drag.phase() != Some(DragPhase::Drag) {
                p.highlight = HighlightMode::Off;
            }
        }
    }

    /// Begin a drag gesture. Returns the playable actually being dragged,
    /// which may differ from `object`:
    ///
    /// - a clone-on-drag card spawns a copy and drags that;
    /// - a quick grab of a stack peels its top card off and drags the card;
    /// - a scrollable list zone forwards the gesture as scrolling and drags
    ///   nothing.
    pub fn begin_drag(
        &mut self,
        object: PlayableId,
        pointer: PointerId,
        position: Vec2,
    ) -> Option<PlayableId> {
        enum Dispatch {
            Base,
            ScrollZone,
            CloneCard { card: CardId, facedown: bool },
            StackTop { top: CardId, top_index: usize },
        }

        let dispatch = {
            let p = self.playables.get(&object)?;
            match &p.kind {
                PlayableKind::Zone(z) if z.scrollable && z.is_list() => Dispatch::ScrollZone,
                PlayableKind::Card(c) if c.clone_on_drag => Dispatch::CloneCard {
                    card: c.card,
                    facedown: c.is_facedown(),
                },
                // A foreign-held stack cannot peel: the removal would be
                // refused host-side and the spawned card would duplicate
                // the one still in the stack.
                PlayableKind::Stack(s)
                    if !s.is_empty()
                        && !p.is_foreign_held(self.local)
                        && p.drag.active_pointers() <= 1
                        && p.drag.hold_time() < self.config.stack_drag_hold_secs =>
                {
                    match s.top() {
                        Some(top) => Dispatch::StackTop {
                            top,
                            top_index: s.len() - 1,
                        },
                        None => Dispatch::Base,
                    }
                }
                _ => Dispatch::Base,
            }
        };

        match dispatch {
            Dispatch::ScrollZone => {
                if let Some(p) = self.playables.get_mut(&object) {
                    p.drag.reset();
                    p.highlight = HighlightMode::Off;
                }
                self.events.push(TableEvent::ScrollForwarded {
                    zone: object,
                    phase: DragPhase::Begin,
                    pointer,
                });
                None
            }
            Dispatch::CloneCard { card, facedown } => {
                let origin = self.playables.get(&object)?.pos();
                if let Some(p) = self.playables.get_mut(&object) {
                    p.drag.reset();
                    p.highlight = HighlightMode::Off;
                }
                let clone = self.spawn(origin, PlayableKind::Card(CardState::with_facing(card, facedown)));
                self.request_authority(clone);
                self.start_drag_on(clone, pointer, position);
                Some(clone)
            }
            Dispatch::StackTop { top, top_index } => {
                let origin = self.playables.get(&object)?.pos();
                // Authority over the stack covers the removal; it is handed
                // back as soon as the peeled card is claimed.
                self.request_authority(object);
                self.outbound.push(Request::StackRemoveAt {
                    stack: object,
                    index: top_index,
                });
                if let Some(p) = self.playables.get_mut(&object) {
                    p.drag.reset();
                    p.highlight = HighlightMode::Off;
                }
                let card = self.spawn(origin, PlayableKind::Card(CardState::with_facing(top, true)));
                self.request_authority(card);
                self.release_authority(object);
                self.start_drag_on(card, pointer, position);
                Some(card)
            }
            Dispatch::Base => {
                let lacks = self
                    .playables
                    .get(&object)
                    .is_some_and(|p| p.lacks_authority(self.local));
                if lacks {
                    self.request_authority(object);
                }
                if let Some(p) = self.playables.get_mut(&object) {
                    p.drag.begin(pointer, position);
                }
                self.forward_scroll_if_inside(object, pointer, DragPhase::Begin, position);
                Some(object)
            }
        }
    }

    /// A drag tick.
    pub fn drag(&mut self, object: PlayableId, pointer: PointerId, position: Vec2) {
        if let Some(p) = self.playables.get_mut(&object) {
            p.drag.drag(pointer, position);
        }
        self.act_on_drag(object, pointer);
    }

    /// The drag's final tick for one pointer. When the last pointer lifts,
    /// the drop resolves.
    pub fn end_drag(&mut self, object: PlayableId, pointer: PointerId, position: Vec2) {
        let remaining = match self.playables.get_mut(&object) {
            Some(p) => {
                let pos = p.pos();
                p.drag.end(pointer, position, pos);
                p.drag.active_pointers()
            }
            None => return,
        };
        if remaining == 0 {
            self.post_drag(object);
        } else {
            self.act_on_drag(object, pointer);
        }
    }

    fn start_drag_on(&mut self, object: PlayableId, pointer: PointerId, position: Vec2) {
        if let Some(p) = self.playables.get_mut(&object) {
            let pos = p.pos();
            p.drag.pointer_down(pointer, position, pos);
            p.drag.begin(pointer, position);
            p.highlight = HighlightMode::Selected;
        }
    }

    /// If the playable sits inside a scrollable list and the pointer is
    /// still within the list's bounds, the gesture scrolls the list.
    fn forward_scroll_if_inside(
        &mut self,
        object: PlayableId,
        pointer: PointerId,
        phase: DragPhase,
        at: Vec2,
    ) -> bool {
        let Some(zone_id) = self.playables.get(&object).and_then(|p| p.zone) else {
            return false;
        };
        let Some(zone) = self.playables.get(&zone_id) else {
            return false;
        };
        let scrollable = zone
            .as_zone()
            .is_some_and(|z| z.scrollable && z.is_list());
        if scrollable && zone.bounds().is_some_and(|b| b.contains(at)) {
            self.events.push(TableEvent::ScrollForwarded {
                zone: zone_id,
                phase,
                pointer,
            });
            return true;
        }
        false
    }

    /// Apply one drag tick: predict position, refresh the drop target, and
    /// derive the highlight.
    fn act_on_drag(&mut self, object: PlayableId, pointer: PointerId) {
        let (target, pointer_mean) = match self.playables.get(&object) {
            Some(p) => match (p.drag.target_position(), p.drag.pointer_centroid()) {
                (Some(t), Some(c)) => (t, c),
                _ => return,
            },
            None => return,
        };

        if self.forward_scroll_if_inside(object, pointer, DragPhase::Drag, pointer_mean) {
            return;
        }

        if self.holder_is_local(object) {
            if let Some(p) = self.playables.get_mut(&object) {
                p.position.set_local(target);
                if let Some(position) = p.position.take_dirty() {
                    self.outbound.push(Request::SetPosition { object, position });
                }
            }
        }

        let current_zone = self.playables.get(&object).and_then(|p| p.zone);
        match self.zone_under(pointer_mean, object) {
            Some(zone_id) => {
                let own_area = current_zone == Some(zone_id)
                    && self
                        .playables
                        .get(&zone_id)
                        .and_then(Playable::as_zone)
                        .is_some_and(|z| !z.is_list());
                if own_area {
                    // Free movement within the containing area; nothing to
                    // commit on release beyond a snap.
                    self.placeholders.remove(&object);
                } else {
                    let index = self.drop_index(zone_id, object, target);
                    // Area zones with a grid quantize the drop position up
                    // front, so the glide already heads for the snapped cell.
                    let position = match self
                        .playables
                        .get(&zone_id)
                        .and_then(Playable::as_zone)
                        .and_then(|z| z.grid())
                    {
                        Some(cell) => target.snap_to_grid(cell),
                        None => target,
                    };
                    self.placeholders.insert(
                        object,
                        PlaceHolder {
                            zone: zone_id,
                            index,
                            position,
                        },
                    );
                }
                self.set_highlight(object, HighlightMode::Authorized);
            }
            None => {
                self.placeholders.remove(&object);
                self.set_highlight(object, HighlightMode::Warn);
            }
        }
    }

    /// Resolve the drop once the last pointer lifts.
    fn post_drag(&mut self, object: PlayableId) {
        let warned = self
            .playables
            .get(&object)
            .is_some_and(|p| p.highlight == HighlightMode::Warn);
        self.set_highlight(object, HighlightMode::Off);

        if let Some(ph) = self.placeholders.get(&object).copied() {
            let immediate = self
                .playables
                .get(&ph.zone)
                .and_then(Playable::as_zone)
                .is_some_and(|z| z.immediate_release);
            if immediate {
                self.commit_drop(object, ph);
            } else if let Some(card) = self.playables.get_mut(&object).and_then(Playable::as_card_mut)
            {
                card.moving_to_placeholder = true;
            }
            return;
        }

        if warned {
            // Dropped over nothing: the playable leaves play. Authority is
            // kept through the delete so nobody else grabs it mid-discard.
            self.delete(object);
            return;
        }

        // Settled inside its own area zone (or never really dragged).
        let snap = self.playables.get(&object).and_then(|p| {
            let zone = p.zone?;
            let grid = self.playables.get(&zone).and_then(Playable::as_zone)?.grid()?;
            Some(p.pos().snap_to_grid(grid))
        });
        if let Some(snapped) = snap {
            if let Some(p) = self.playables.get_mut(&object) {
                p.position.set_local(snapped);
                if let Some(position) = p.position.take_dirty() {
                    self.outbound.push(Request::SetPosition { object, position });
                }
            }
        }
        if self.holder_is_local(object) {
            self.release_authority(object);
        }
    }

    /// Commit a resolved drop: reparent, then hand authority back.
    fn commit_drop(&mut self, object: PlayableId, ph: PlaceHolder) {
        self.placeholders.remove(&object);
        if let Some(card) = self.playables.get_mut(&object).and_then(Playable::as_card_mut) {
            card.moving_to_placeholder = false;
        }
        self.outbound.push(Request::Reparent {
            object,
            zone: Some(ph.zone),
            index: ph.index,
            position: ph.position,
        });
        // The holder applies optimistically; everyone else converges on the
        // host's echo, which the idempotent application absorbs.
        if self.holder_is_local(object) {
            self.apply_reparent(object, Some(ph.zone), ph.index, ph.position);
        }
        self.release_authority(object);
    }

    /// Topmost zone whose bounds contain `point`, excluding the dragged
    /// playable itself.
    fn zone_under(&self, point: Vec2, exclude: PlayableId) -> Option<PlayableId> {
        self.spawn_order
            .iter()
            .rev()
            .copied()
            .find(|&id| {
                id != exclude
                    && self
                        .playables
                        .get(&id)
                        .and_then(|p| p.bounds())
                        .is_some_and(|b| b.contains(point))
            })
    }

    /// Child index a drop at `target` slots into.
    fn drop_index(&self, zone_id: PlayableId, object: PlayableId, target: Vec2) -> usize {
        let Some(zone) = self.playables.get(&zone_id).and_then(Playable::as_zone) else {
            return 0;
        };
        if !zone.is_list() {
            return zone.len();
        }
        let positions: Vec<Vec2> = zone
            .children()
            .iter()
            .map(|c| self.playables.get(c).map_or(Vec2::ZERO, Playable::pos))
            .collect();
        let current = if self.playables.get(&object).and_then(|p| p.zone) == Some(zone_id) {
            zone.index_of(object)
        } else {
            None
        };
        insertion_index(zone.layout, &positions, target, current)
    }

    fn set_highlight(&mut self, object: PlayableId, highlight: HighlightMode) {
        if let Some(p) = self.playables.get_mut(&object) {
            p.highlight = highlight;
        }
    }

    fn holder_is_local(&self, object: PlayableId) -> bool {
        self.playables.get(&object).is_some_and(|p| p.holder == Some(self.local))
    }

    // ----- frame update ---------------------------------------------------

    /// Advance animations and timers by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.clock += dt;

        let ids: Vec<PlayableId> = self.spawn_order.clone();

        for &id in &ids {
            let fired = self
                .playables
                .get_mut(&id)
                .is_some_and(|p| p.drag.tick_hold(dt, self.config.hold_preview_secs));
            if fired {
                self.events.push(TableEvent::PreviewRequested { object: id });
            }
        }

        self.step_placeholders(dt);

        if self.role == TableRole::Host {
            for &id in &ids {
                let mut produced = None;
                if let Some(p) = self.playables.get_mut(&id) {
                    if let PlayableKind::Die(die) = &mut p.kind {
                        if let Some(value) = die.tick(dt, &mut self.rng) {
                            // Applied in place; only the broadcast remains.
                            let _ = die.value.take_dirty();
                            produced = Some(value);
                        }
                    }
                }
                if let Some(value) = produced {
                    self.updates.push(Update::DieValue { die: id, value });
                }
            }
        }
    }

    /// Glide released playables toward their placeholders and commit on
    /// arrival.
    fn step_placeholders(&mut self, dt: f32) {
        let transiting: Vec<(PlayableId, PlaceHolder)> = self
            .placeholders
            .iter()
            .filter(|(id, _)| {
                self.playables
                    .get(id)
                    .is_some_and(|p| p.drag.active_pointers() == 0)
            })
            .map(|(&id, &ph)| (id, ph))
            .collect();

        for (id, ph) in transiting {
            if !self.holder_is_local(id) {
                // The claim was lost (or never granted); without authority
                // nothing may move or commit.
                self.placeholders.remove(&id);
                if let Some(card) = self.playables.get_mut(&id).and_then(Playable::as_card_mut) {
                    card.moving_to_placeholder = false;
                }
                continue;
            }
            if !self.playables.contains_key(&ph.zone) {
                warn!("placeholder zone {} vanished, dropping {} in place", ph.zone, id);
                self.placeholders.remove(&id);
                if let Some(card) = self.playables.get_mut(&id).and_then(Playable::as_card_mut) {
                    card.moving_to_placeholder = false;
                }
                self.release_authority(id);
                continue;
            }
            let arrived = match self.playables.get_mut(&id) {
                Some(p) => {
                    let stepped = p.pos().move_toward(ph.position, self.config.movement_speed * dt);
                    p.position.set_local(stepped);
                    stepped.distance(ph.position) <= self.config.arrive_epsilon
                }
                None => {
                    self.placeholders.remove(&id);
                    continue;
                }
            };
            if let Some(position) = self
                .playables
                .get_mut(&id)
                .and_then(|p| p.position.take_dirty())
            {
                self.outbound.push(Request::SetPosition { object: id, position });
            }
            if arrived {
                self.commit_drop(id, ph);
            }
        }
    }

    // ----- host arbitration -----------------------------------------------

    /// Apply an inbound request on the hosting replica.
    ///
    /// Refused requests are logged and dropped; the sender is never told.
    pub fn host_apply(&mut self, from: ParticipantId, request: Request) {
        if let Err(rejection) = self.process_request(from, request) {
            warn!("dropped request from {from}: {rejection}");
        }
    }

    fn process_request(&mut self, from: ParticipantId, request: Request) -> Result<(), Rejection> {
        let object = request.object();
        if !request
            .policy()
            .permits(from, self.arbiter.holder(object), self.host)
        {
            return Err(Rejection::NotAuthorized { object, sender: from });
        }

        let update = match request {
            Request::RequestAuthority { object } => {
                self.require(object)?;
                if !self.arbiter.request(object, from) {
                    // Losing the race is silent.
                    return Ok(());
                }
                Update::AuthorityChanged {
                    object,
                    holder: Some(from),
                }
            }
            Request::ReleaseAuthority { object } => {
                if !self.arbiter.release(object, from) {
                    return Ok(());
                }
                Update::AuthorityChanged { object, holder: None }
            }
            Request::ForceRelease { object } => {
                if self.arbiter.force_release(object).is_none() {
                    return Ok(());
                }
                Update::AuthorityChanged { object, holder: None }
            }
            Request::Spawn { snapshot } => {
                let id = snapshot.id;
                if self.playables.contains_key(&id) && id.spawner() != from {
                    return Err(Rejection::SpawnCollision { object: id });
                }
                // The spawner already has its local copy; the broadcast is
                // for everyone else and the internal application skips it.
                Update::Spawned { snapshot }
            }
            Request::SetPosition { object, position } => {
                self.require(object)?;
                Update::Position { object, position }
            }
            Request::SetRotation { object, degrees } => {
                self.require(object)?;
                Update::Rotation { object, degrees }
            }
            Request::SetFaceDown { object, facedown } => {
                self.require_card(object)?;
                Update::FaceDown { object, facedown }
            }
            Request::SetLabel { object, label } => {
                self.require_stack(object)?;
                Update::Label { object, label }
            }
            Request::StackInsert { stack, index, card } => {
                let len = self.require_stack(stack)?.len();
                Update::StackInserted {
                    stack,
                    index: index.min(len),
                    card,
                }
            }
            Request::StackRemoveAt { stack, index } => {
                let len = self.require_stack(stack)?.len();
                if index >= len {
                    // Raced with another removal; nothing to do.
                    return Ok(());
                }
                Update::StackRemoved { stack, index }
            }
            Request::StackShuffle { stack } => {
                let mut cards = self.require_stack(stack)?.cards().to_vec();
                self.rng.shuffle(&mut cards);
                Update::StackOrder { stack, cards }
            }
            Request::DieRoll { die } => {
                match self.playables.get_mut(&die) {
                    None => return Err(Rejection::UnknownPlayable { object: die }),
                    Some(p) => match &mut p.kind {
                        PlayableKind::Die(d) => {
                            // Values broadcast from the frame update while
                            // the roll tumbles.
                            d.start_roll();
                            return Ok(());
                        }
                        _ => return Err(Rejection::WrongKind { object: die }),
                    },
                }
            }
            Request::DieSetValue { die, value } => {
                let wrapped = self.require_die(die)?.wrap(value);
                Update::DieValue { die, value: wrapped }
            }
            Request::CounterSetValue { counter, value } => {
                self.require_counter(counter)?;
                Update::CounterValue { counter, value }
            }
            Request::CounterSetColor { counter, color } => {
                self.require_counter(counter)?;
                Update::CounterColor { counter, color }
            }
            Request::Reparent {
                object,
                zone,
                index,
                position,
            } => {
                self.require(object)?;
                if let Some(zone_id) = zone {
                    if self
                        .playables
                        .get(&zone_id)
                        .and_then(Playable::as_zone)
                        .is_none()
                    {
                        return Err(Rejection::WrongKind { object: zone_id });
                    }
                }
                Update::Reparented {
                    object,
                    zone,
                    index,
                    position,
                }
            }
            Request::Delete { object } => {
                self.require(object)?;
                match self.arbiter.holder(object) {
                    Some(holder) if holder != from => {
                        return Err(Rejection::HeldByOther { object, holder })
                    }
                    _ => {}
                }
                Update::Removed { object }
            }
        };

        self.broadcast(update);
        Ok(())
    }

    /// Apply on the hosting replica and queue for everyone else.
    fn broadcast(&mut self, update: Update) {
        self.apply_update_internal(update.clone());
        self.updates.push(update);
    }

    fn require(&self, object: PlayableId) -> Result<&Playable, Rejection> {
        self.playables
            .get(&object)
            .ok_or(Rejection::UnknownPlayable { object })
    }

    fn require_card(&self, object: PlayableId) -> Result<&CardState, Rejection> {
        self.require(object)?
            .as_card()
            .ok_or(Rejection::WrongKind { object })
    }

    fn require_stack(&self, object: PlayableId) -> Result<&StackState, Rejection> {
        self.require(object)?
            .as_stack()
            .ok_or(Rejection::WrongKind { object })
    }

    fn require_die(&self, object: PlayableId) -> Result<&DieState, Rejection> {
        self.require(object)?
            .as_die()
            .ok_or(Rejection::WrongKind { object })
    }

    fn require_counter(&self, object: PlayableId) -> Result<&CounterState, Rejection> {
        self.require(object)?
            .as_counter()
            .ok_or(Rejection::WrongKind { object })
    }

    // ----- replicated state application ----------------------------------

    /// Apply an inbound host update on a client replica.
    pub fn apply_update(&mut self, update: Update) {
        self.apply_update_internal(update);
    }

    fn apply_update_internal(&mut self, update: Update) {
        match update {
            Update::Spawned { snapshot } => {
                let id = snapshot.id;
                if self.playables.contains_key(&id) {
                    // The local replica spawned this itself.
                    return;
                }
                let zone = snapshot.zone;
                self.playables.insert(id, Playable::from_snapshot(snapshot));
                self.spawn_order.push(id);
                if let Some(zone_id) = zone {
                    if let Some(zs) = self
                        .playables
                        .get_mut(&zone_id)
                        .and_then(Playable::as_zone_mut)
                    {
                        zs.insert_child(usize::MAX, id);
                        self.events.push(TableEvent::AddedToZone {
                            zone: zone_id,
                            child: id,
                        });
                    }
                }
            }
            Update::AuthorityChanged { object, holder } => {
                if let Some(p) = self.playables.get_mut(&object) {
                    p.holder = holder;
                    match holder {
                        Some(h) if h != self.local => p.foreign_touched = true,
                        // A local claim clears the foreign tint.
                        Some(_) => p.foreign_touched = false,
                        None => {}
                    }
                }
            }
            Update::Position { object, position } => {
                // Local prediction wins while holding authority.
                if self.holder_is_local(object) {
                    return;
                }
                if let Some(p) = self.playables.get_mut(&object) {
                    p.position.apply_remote(position);
                }
            }
            Update::Rotation { object, degrees } => {
                if self.holder_is_local(object) {
                    return;
                }
                if let Some(p) = self.playables.get_mut(&object) {
                    p.rotation.apply_remote(degrees);
                }
            }
            Update::FaceDown { object, facedown } => {
                if let Some(card) = self.playables.get_mut(&object).and_then(Playable::as_card_mut)
                {
                    card.facedown.apply_remote(facedown);
                }
            }
            Update::Label { object, label } => {
                if let Some(stack) = self
                    .playables
                    .get_mut(&object)
                    .and_then(Playable::as_stack_mut)
                {
                    stack.label.apply_remote(label);
                }
            }
            Update::StackInserted { stack, index, card } => {
                if let Some(s) = self.playables.get_mut(&stack).and_then(Playable::as_stack_mut) {
                    s.insert(index, card);
                }
            }
            Update::StackRemoved { stack, index } => {
                if let Some(s) = self.playables.get_mut(&stack).and_then(Playable::as_stack_mut) {
                    let _ = s.remove_at(index);
                }
            }
            Update::StackOrder { stack, cards } => {
                let now = self.clock;
                if let Some(s) = self.playables.get_mut(&stack).and_then(Playable::as_stack_mut) {
                    s.replace_all(cards);
                    s.last_shuffle_at = Some(now);
                }
            }
            Update::DieValue { die, value } => {
                if let Some(d) = self.playables.get_mut(&die).and_then(Playable::as_die_mut) {
                    d.value.apply_remote(value);
                }
            }
            Update::CounterValue { counter, value } => {
                if let Some(c) = self
                    .playables
                    .get_mut(&counter)
                    .and_then(Playable::as_counter_mut)
                {
                    c.value.apply_remote(value);
                }
            }
            Update::CounterColor { counter, color } => {
                if let Some(c) = self
                    .playables
                    .get_mut(&counter)
                    .and_then(Playable::as_counter_mut)
                {
                    c.color.apply_remote(color);
                }
            }
            Update::Reparented {
                object,
                zone,
                index,
                position,
            } => {
                self.apply_reparent(object, zone, index, position);
            }
            Update::Removed { object } => {
                self.apply_removed(object);
            }
        }
    }

    /// Install zone membership. Idempotent: the authority holder applies
    /// this optimistically and then again when the host's echo arrives.
    fn apply_reparent(
        &mut self,
        object: PlayableId,
        zone: Option<PlayableId>,
        index: usize,
        position: Vec2,
    ) {
        let Some(old) = self.playables.get(&object).map(|p| p.zone) else {
            return;
        };

        if old == zone {
            // Reorder within the same container; membership is unchanged so
            // no add/remove events fire (the echo would double them).
            if let Some(zone_id) = zone {
                if let Some(zs) = self
                    .playables
                    .get_mut(&zone_id)
                    .and_then(Playable::as_zone_mut)
                {
                    zs.insert_child(index, object);
                }
            }
        } else {
            if let Some(old_zone) = old {
                if let Some(zs) = self
                    .playables
                    .get_mut(&old_zone)
                    .and_then(Playable::as_zone_mut)
                {
                    if zs.remove_child(object) {
                        self.events.push(TableEvent::RemovedFromZone {
                            zone: old_zone,
                            child: object,
                        });
                    }
                }
            }

            let mut added = false;
            let mut face = None;
            let mut action = None;
            if let Some(new_zone) = zone {
                if let Some(zs) = self
                    .playables
                    .get_mut(&new_zone)
                    .and_then(Playable::as_zone_mut)
                {
                    zs.insert_child(index, object);
                    face = match zs.face_preference {
                        FacePreference::Up => Some(false),
                        FacePreference::Down => Some(true),
                        FacePreference::Any => None,
                    };
                    action = zs.default_action;
                    added = true;
                }
            }
            if let Some(p) = self.playables.get_mut(&object) {
                p.zone = if added { zone } else { None };
                if let Some(card) = p.as_card_mut() {
                    if let Some(facedown) = face {
                        card.facedown.apply_remote(facedown);
                    }
                    if added {
                        card.default_action = action;
                    }
                }
            }
            if added {
                if let Some(new_zone) = zone {
                    self.events.push(TableEvent::AddedToZone {
                        zone: new_zone,
                        child: object,
                    });
                }
            }
        }

        if !self.holder_is_local(object) {
            if let Some(p) = self.playables.get_mut(&object) {
                p.position.apply_remote(position);
            }
        }
    }

    fn apply_removed(&mut self, object: PlayableId) {
        let Some(playable) = self.playables.remove(&object) else {
            return;
        };
        self.spawn_order.retain(|&id| id != object);
        self.placeholders.remove(&object);
        self.arbiter.forget(object);

        if let Some(zone) = playable.zone {
            if let Some(zs) = self.playables.get_mut(&zone).and_then(Playable::as_zone_mut) {
                if zs.remove_child(object) {
                    self.events.push(TableEvent::RemovedFromZone { zone, child: object });
                }
            }
        }

        // Children of a removed zone fall back to the open table.
        if let PlayableKind::Zone(zs) = &playable.kind {
            for child in zs.children() {
                if let Some(c) = self.playables.get_mut(child) {
                    c.zone = None;
                }
            }
        }

        self.events.push(TableEvent::Discarded { object });
    }
}
