//! In-memory storage and checkpoint collaborator
//!
//! Destination tables map a JSON primary key to the JSON row image. Staging
//! tables are keyed by `(updated, key)`, so rewriting the same change is an
//! upsert and iteration follows changefeed time.

use std::collections::{BTreeMap, HashMap, HashSet};

use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use contracts::{
    CheckpointHandler, CheckpointOutcome, ContractError, QualifiedTable, ResolvedDescriptor,
    RowMutation, SinkTarget, StagingStore, Timestamp,
};

/// Destination rows: primary key -> row image
type Rows = BTreeMap<String, String>;

/// Staged mutations: (updated, primary key) -> row image, `None` deletes
type Staged = BTreeMap<(Timestamp, String), Option<String>>;

/// Process-local store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<QualifiedTable, Rows>>,
    sink_dbs: RwLock<HashSet<String>>,
    staging: RwLock<HashMap<QualifiedTable, Staged>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose destination tables exist up front, empty
    pub fn with_tables(tables: impl IntoIterator<Item = QualifiedTable>) -> Self {
        Self {
            tables: RwLock::new(tables.into_iter().map(|t| (t, Rows::new())).collect()),
            ..Default::default()
        }
    }

    /// Rows of a destination table in key order
    pub async fn rows(&self, table: &QualifiedTable) -> Option<Vec<(String, String)>> {
        self.tables
            .read()
            .await
            .get(table)
            .map(|rows| rows.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// Number of mutations waiting in a staging table
    pub async fn staged_len(&self, staging: &QualifiedTable) -> Option<usize> {
        self.staging.read().await.get(staging).map(BTreeMap::len)
    }

    pub async fn sink_db_exists(&self, database: &str) -> bool {
        self.sink_dbs.read().await.contains(&database.to_lowercase())
    }
}

impl StagingStore for MemoryStore {
    #[instrument(name = "memory_store_create_sink_db", skip(self))]
    async fn create_sink_db(&self, database: &str) -> Result<(), ContractError> {
        self.sink_dbs.write().await.insert(database.to_lowercase());
        Ok(())
    }

    #[instrument(name = "memory_store_drop_sink_db", skip(self))]
    async fn drop_sink_db(&self, database: &str) -> Result<(), ContractError> {
        let database = database.to_lowercase();
        self.sink_dbs.write().await.remove(&database);

        let mut staging = self.staging.write().await;
        let before = staging.len();
        staging.retain(|table, _| table.database() != database);
        info!(
            database = %database,
            dropped = before - staging.len(),
            "Sink database dropped"
        );
        Ok(())
    }

    async fn table_exists(&self, table: &QualifiedTable) -> Result<bool, ContractError> {
        Ok(self.tables.read().await.contains_key(table))
    }

    #[instrument(name = "memory_store_create_staging_table", skip(self), fields(staging = %staging))]
    async fn create_staging_table(&self, staging: &QualifiedTable) -> Result<(), ContractError> {
        if !self.sink_dbs.read().await.contains(staging.database()) {
            return Err(ContractError::storage(format!(
                "database {} does not exist",
                staging.database()
            )));
        }
        self.staging
            .write()
            .await
            .entry(staging.clone())
            .or_default();
        Ok(())
    }

    async fn write_to_staging_table(
        &self,
        staging: &QualifiedTable,
        mutation: &RowMutation,
    ) -> Result<(), ContractError> {
        let mut tables = self.staging.write().await;
        let Some(staged) = tables.get_mut(staging) else {
            return Err(ContractError::staging_write(
                staging.to_string(),
                "staging table does not exist",
            ));
        };
        staged.insert(
            (mutation.updated, mutation.key.clone()),
            mutation.after.clone(),
        );
        Ok(())
    }
}

impl CheckpointHandler for MemoryStore {
    /// Apply every staged mutation at or before the resolved timestamp, in
    /// timestamp order, and remove it from staging. Later mutations stay staged.
    #[instrument(
        name = "memory_store_handle_resolved",
        skip(self, resolved, targets),
        fields(endpoint = resolved.endpoint(), resolved = %resolved.timestamp())
    )]
    async fn handle_resolved(
        &self,
        resolved: &ResolvedDescriptor,
        targets: &[SinkTarget],
    ) -> Result<CheckpointOutcome, ContractError> {
        // Lock order: staging, then tables
        let mut staging = self.staging.write().await;
        let mut tables = self.tables.write().await;

        for target in targets {
            if !tables.contains_key(&target.destination) {
                return Err(ContractError::checkpoint(
                    resolved.endpoint(),
                    format!("table {} could not be found", target.destination),
                ));
            }
            if !staging.contains_key(&target.staging) {
                return Err(ContractError::checkpoint(
                    resolved.endpoint(),
                    format!("staging table {} does not exist", target.staging),
                ));
            }
        }

        let mut outcome = CheckpointOutcome::default();
        for target in targets {
            let (Some(staged), Some(rows)) = (
                staging.get_mut(&target.staging),
                tables.get_mut(&target.destination),
            ) else {
                continue;
            };

            let ready = take_ready(staged, resolved.timestamp());
            let applied = ready.len();
            for ((_, key), after) in ready {
                match after {
                    Some(row) => rows.insert(key, row),
                    None => rows.remove(&key),
                };
            }

            if applied > 0 {
                debug!(
                    destination = %target.destination,
                    applied,
                    remaining = staged.len(),
                    "Staged mutations applied"
                );
            }
            outcome.applied += applied;
        }

        Ok(outcome)
    }
}

/// Split off the mutations at or before `resolved`, leaving the rest staged
fn take_ready(staged: &mut Staged, resolved: &Timestamp) -> Staged {
    let first_later = staged
        .keys()
        .find(|(updated, _)| updated > resolved)
        .cloned();
    match first_later {
        Some(key) => {
            let later = staged.split_off(&key);
            std::mem::replace(staged, later)
        }
        None => std::mem::take(staged),
    }
}
