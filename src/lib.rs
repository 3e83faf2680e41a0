//! # cardtable
//!
//! The core of a shared virtual tabletop for networked card games:
//! replicated playable objects with host-arbitrated write authority, a
//! multi-pointer drag gesture model, and zone containers with a drop-order
//! layout engine.
//!
//! ## Design Principles
//!
//! 1. **Host-Arbitrated**: One participant hosts. All mutation flows as
//!    requests to the host, which validates and broadcasts updates; every
//!    replica converges on the same scene.
//!
//! 2. **Exclusive Write Authority**: Dragging a playable requires claiming
//!    it first. The first request wins; losers are silently ignored.
//!
//! 3. **Transport-Agnostic**: Requests and updates are plain serializable
//!    values. The embedding supplies delivery, rendering, and input.
//!
//! ## Modules
//!
//! - `core`: Ids, 2D geometry, deterministic RNG
//! - `catalog`: Read-only card metadata lookup
//! - `sync`: Replicated fields, authority arbitration, the wire model
//! - `input`: The drag gesture state machine
//! - `table`: Playable entities (card, stack, zone, die, counter, token)
//!   and the table replica that ties everything together

pub mod catalog;
pub mod core;
pub mod input;
pub mod sync;
pub mod table;

// Re-export commonly used types
pub use crate::core::{CardId, ParticipantId, PlayableId, PointerId, Rect, TableRng, Vec2};

pub use crate::catalog::{CardCatalog, CardInfo};

pub use crate::sync::{AuthorityArbiter, Rejection, Request, SyncField, Update, WritePolicy};

pub use crate::input::{DragPhase, DragTracker, HighlightMode};

pub use crate::table::{
    CardAction, CardState, Color, CounterState, DieState, FacePreference, Playable, PlayableKind,
    PlayableSnapshot, PlaceHolder, StackState, Table, TableConfig, TableEvent, TableRole,
    ZoneLayout, ZoneState,
};
