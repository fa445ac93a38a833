//! Mock collaborators for unit tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use contracts::{
    CheckpointHandler, CheckpointOutcome, ContractError, QualifiedTable, ResolvedDescriptor,
    RowMutation, SinkTarget, StagingStore,
};

/// In-process store recording every call
#[derive(Default)]
pub struct MockStore {
    /// Destination tables that exist
    pub tables: HashSet<QualifiedTable>,
    /// Writes of mutations with this key fail
    pub fail_key: Option<String>,
    /// Checkpoints fail
    pub fail_checkpoint: bool,
    pub staging_tables: Mutex<HashSet<QualifiedTable>>,
    pub writes: Mutex<HashMap<QualifiedTable, Vec<RowMutation>>>,
    pub resolved: Mutex<Vec<(ResolvedDescriptor, usize)>>,
}

impl MockStore {
    pub fn with_tables(tables: &[(&str, &str)]) -> Self {
        Self {
            tables: tables
                .iter()
                .map(|(db, table)| QualifiedTable::new(db, table))
                .collect(),
            ..Default::default()
        }
    }

    pub fn written(&self, staging: &QualifiedTable) -> Vec<RowMutation> {
        self.writes
            .lock()
            .unwrap()
            .get(staging)
            .cloned()
            .unwrap_or_default()
    }
}

impl StagingStore for MockStore {
    async fn create_sink_db(&self, _database: &str) -> Result<(), ContractError> {
        Ok(())
    }

    async fn drop_sink_db(&self, _database: &str) -> Result<(), ContractError> {
        Ok(())
    }

    async fn table_exists(&self, table: &QualifiedTable) -> Result<bool, ContractError> {
        Ok(self.tables.contains(table))
    }

    async fn create_staging_table(&self, staging: &QualifiedTable) -> Result<(), ContractError> {
        self.staging_tables.lock().unwrap().insert(staging.clone());
        Ok(())
    }

    async fn write_to_staging_table(
        &self,
        staging: &QualifiedTable,
        mutation: &RowMutation,
    ) -> Result<(), ContractError> {
        if self.fail_key.as_deref() == Some(mutation.key.as_str()) {
            return Err(ContractError::staging_write(staging.to_string(), "mock failure"));
        }
        self.writes
            .lock()
            .unwrap()
            .entry(staging.clone())
            .or_default()
            .push(mutation.clone());
        Ok(())
    }
}

impl CheckpointHandler for MockStore {
    async fn handle_resolved(
        &self,
        resolved: &ResolvedDescriptor,
        targets: &[SinkTarget],
    ) -> Result<CheckpointOutcome, ContractError> {
        if self.fail_checkpoint {
            return Err(ContractError::checkpoint(resolved.endpoint(), "mock failure"));
        }
        self.resolved
            .lock()
            .unwrap()
            .push((resolved.clone(), targets.len()));
        Ok(CheckpointOutcome { applied: 0 })
    }
}

/// Changefeed record with the given key
pub fn record(key: u32) -> String {
    format!(
        r#"{{"after": {{"id": {key}}}, "key": [{key}], "updated": "1585861087210714000.{key:010}"}}"#
    )
}
