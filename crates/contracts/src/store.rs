//! Collaborator traits - storage, record decoding, checkpoint application
//!
//! The sink core only routes; persistence and apply semantics live behind
//! these traits.

use crate::{ContractError, QualifiedTable, ResolvedDescriptor, RowMutation, SinkTarget};

/// Relational storage used by the registry and the sink handles.
#[trait_variant::make(StagingStore: Send)]
pub trait LocalStagingStore {
    /// Create the database holding staging tables (no-op if present)
    async fn create_sink_db(&self, database: &str) -> Result<(), ContractError>;

    /// Drop the database holding staging tables and everything in it
    async fn drop_sink_db(&self, database: &str) -> Result<(), ContractError>;

    /// Whether a destination table exists
    async fn table_exists(&self, table: &QualifiedTable) -> Result<bool, ContractError>;

    /// Provision a staging table (no-op if present)
    async fn create_staging_table(&self, staging: &QualifiedTable) -> Result<(), ContractError>;

    /// Append one mutation to a staging table
    ///
    /// # Errors
    /// Returns write error (should include the table name)
    async fn write_to_staging_table(
        &self,
        staging: &QualifiedTable,
        mutation: &RowMutation,
    ) -> Result<(), ContractError>;
}

/// Line-level decoding of an ndjson record.
pub trait RecordDecoder: Send + Sync {
    /// Decode one record (without its trailing newline)
    fn decode_record(&self, line: &[u8]) -> Result<RowMutation, ContractError>;
}

/// Result of applying a resolved checkpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckpointOutcome {
    /// Mutations moved from staging into destination tables
    pub applied: usize,
}

/// Applies staged mutations up to a resolved timestamp.
#[trait_variant::make(CheckpointHandler: Send)]
pub trait LocalCheckpointHandler {
    /// Handle a resolved checkpoint for every registered sink
    async fn handle_resolved(
        &self,
        resolved: &ResolvedDescriptor,
        targets: &[SinkTarget],
    ) -> Result<CheckpointOutcome, ContractError>;
}
