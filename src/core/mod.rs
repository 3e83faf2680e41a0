//! Core types: ids, geometry, deterministic RNG.
//!
//! These are the building blocks the rest of the crate is written in terms
//! of; nothing here knows about replication or gestures.

pub mod geom;
pub mod ids;
pub mod rng;

pub use geom::{Rect, Vec2};
pub use ids::{CardId, ParticipantId, PlayableId, PointerId};
pub use rng::TableRng;
