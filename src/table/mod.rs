//! The shared scene: playable entities and the table replica that hosts
//! them.

pub mod card;
pub mod counter;
pub mod die;
pub mod playable;
pub mod stack;
#[allow(clippy::module_inception)]
pub mod table;
pub mod zone;

pub use card::{CardAction, CardState, MOVEMENT_SPEED};
pub use counter::{Color, CounterState};
pub use die::DieState;
pub use playable::{Playable, PlayableKind, PlayableSnapshot, SnapshotKind};
pub use stack::StackState;
pub use table::{PlaceHolder, Table, TableConfig, TableEvent, TableRole};
pub use zone::{insertion_index, FacePreference, ZoneLayout, ZoneState};
