//! Replication primitives: observable fields, authority arbitration, and
//! the request/update wire model.

pub mod authority;
pub mod field;
pub mod message;

pub use authority::{AuthorityArbiter, WritePolicy};
pub use field::SyncField;
pub use message::{Rejection, Request, Update};
