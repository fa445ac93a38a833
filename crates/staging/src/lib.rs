//! # Staging
//!
//! In-memory storage collaborator: destination tables, the sink database
//! with its staging tables, and resolved-checkpoint application.

mod memory;

pub use contracts::{CheckpointHandler, StagingStore};
pub use memory::MemoryStore;
