//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the sink: wire-level
//! value types, the storage collaborator traits, and the configuration model.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Changefeed events are ordered by [`Timestamp`]: wall time (seconds),
//!   nanoseconds, then a logical counter
//! - Applying staged mutations up to a resolved checkpoint relies on that order

mod blueprint;
mod descriptor;
mod error;
mod mutation;
mod store;
mod table;
mod timestamp;
mod topic;

pub use blueprint::*;
pub use descriptor::{NdjsonDescriptor, ResolvedDescriptor, Uniquer};
pub use error::*;
pub use mutation::RowMutation;
pub use store::*;
pub use table::{QualifiedTable, SinkTarget};
pub use timestamp::{Timestamp, TimestampError, LOGICAL_LEN, WALL_TIME_LEN, WIRE_LEN};
pub use topic::TopicName;
