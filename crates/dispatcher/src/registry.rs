//! SinkRegistry - topic name to SinkHandle mapping
//!
//! Populated once at startup through `&mut self`, then moved into the
//! dispatcher and only read while requests are served.

use std::collections::HashMap;

use tracing::{info, instrument};

use contracts::{QualifiedTable, SinkTarget, StagingStore, TopicName, DEFAULT_MAX_RECORD_BYTES};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;

/// Add-only registry of sink handles
#[derive(Debug)]
pub struct SinkRegistry {
    /// Database holding the staging tables
    sink_db: String,
    /// Record size limit handed to every new handle
    max_record_bytes: usize,
    sinks: HashMap<TopicName, SinkHandle>,
    targets: Vec<SinkTarget>,
}

impl SinkRegistry {
    pub fn new(sink_db: impl Into<String>) -> Self {
        Self {
            sink_db: sink_db.into(),
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            sinks: HashMap::new(),
            targets: Vec::new(),
        }
    }

    /// Set the longest ndjson record sinks added from now on will hold
    pub fn with_max_record_bytes(mut self, max_record_bytes: usize) -> Self {
        self.max_record_bytes = max_record_bytes;
        self
    }

    /// Register a sink for `destination_db.destination_table`.
    ///
    /// Checks the destination exists, provisions its staging table and stores
    /// the handle under the destination table name. Lookups go by changefeed
    /// topic, so a sink is only found when the topic equals that name.
    ///
    /// # Errors
    /// `TableNotFound`, `DuplicateSink`, or `SinkCreation` on storage failure.
    #[instrument(
        name = "sink_registry_add_sink",
        skip(self, store),
        fields(sink_db = %self.sink_db)
    )]
    pub async fn add_sink<S>(
        &mut self,
        store: &S,
        source_table: &str,
        destination_db: &str,
        destination_table: &str,
    ) -> Result<(), DispatcherError>
    where
        S: StagingStore + Sync,
    {
        let key = TopicName::new(destination_table);
        if self.sinks.contains_key(&key) {
            return Err(DispatcherError::DuplicateSink { key });
        }

        let destination = QualifiedTable::new(destination_db, destination_table);
        let exists = store
            .table_exists(&destination)
            .await
            .map_err(|e| DispatcherError::sink_creation(key.as_str(), e))?;
        if !exists {
            return Err(DispatcherError::TableNotFound { table: destination });
        }

        let staging = QualifiedTable::staging_for(&self.sink_db, &destination);
        store
            .create_staging_table(&staging)
            .await
            .map_err(|e| DispatcherError::sink_creation(key.as_str(), e))?;

        let handle = SinkHandle::new(
            TopicName::new(source_table),
            destination,
            staging,
            self.max_record_bytes,
        );
        info!(
            key = %key,
            source_table = %handle.source_table(),
            destination = %handle.destination(),
            staging = %handle.staging(),
            "Sink registered"
        );

        self.targets.push(handle.target());
        self.sinks.insert(key, handle);
        Ok(())
    }

    /// Find the handle for a topic (case-insensitive). Absence is not an error here.
    pub fn find_sink(&self, topic: &str) -> Option<&SinkHandle> {
        if topic.bytes().any(|b| b.is_ascii_uppercase()) || !topic.is_ascii() {
            self.sinks.get(topic.to_lowercase().as_str())
        } else {
            self.sinks.get(topic)
        }
    }

    /// Every registered sink, in registration order
    pub fn targets(&self) -> &[SinkTarget] {
        &self.targets
    }

    /// Iterate over `(key, handle)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&TopicName, &SinkHandle)> {
        self.sinks.iter()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockStore;

    #[tokio::test]
    async fn test_add_and_find() {
        let store = MockStore::with_tables(&[("defaultdb", "orders"), ("defaultdb", "users")]);
        let mut registry = SinkRegistry::new("_cdc_sink").with_max_record_bytes(1024);

        registry
            .add_sink(&store, "orders", "defaultdb", "orders")
            .await
            .unwrap();
        registry
            .add_sink(&store, "users", "defaultdb", "Users")
            .await
            .unwrap();

        assert_eq!(registry.len(), 2);
        let orders = registry.find_sink("orders").unwrap();
        assert_eq!(orders.destination().to_string(), "defaultdb.orders");
        assert_eq!(orders.staging().to_string(), "_cdc_sink.defaultdb_orders");
        assert_eq!(orders.max_record_bytes(), 1024);
        assert_eq!(
            registry.find_sink("USERS").unwrap().destination().table(),
            "users"
        );
        assert!(registry.find_sink("payments").is_none());

        let staging = store.staging_tables.lock().unwrap();
        assert!(staging.contains(&QualifiedTable::new("_cdc_sink", "defaultdb_orders")));
        assert!(staging.contains(&QualifiedTable::new("_cdc_sink", "defaultdb_users")));
    }

    #[tokio::test]
    async fn test_keyed_by_destination_table() {
        let store = MockStore::with_tables(&[("defaultdb", "orders_copy")]);
        let mut registry = SinkRegistry::new("_cdc_sink");
        registry
            .add_sink(&store, "orders", "defaultdb", "orders_copy")
            .await
            .unwrap();

        assert!(registry.find_sink("orders").is_none());
        assert_eq!(
            registry.find_sink("orders_copy").unwrap().source_table(),
            &TopicName::new("orders")
        );
    }

    #[tokio::test]
    async fn test_missing_destination_table() {
        let store = MockStore::default();
        let mut registry = SinkRegistry::new("_cdc_sink");

        let err = registry
            .add_sink(&store, "orders", "defaultdb", "orders")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatcherError::TableNotFound { .. }));
        assert!(registry.is_empty());
        assert!(store.staging_tables.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_sink() {
        let store = MockStore::with_tables(&[("defaultdb", "orders"), ("other", "orders")]);
        let mut registry = SinkRegistry::new("_cdc_sink");
        registry
            .add_sink(&store, "orders", "defaultdb", "orders")
            .await
            .unwrap();

        let err = registry
            .add_sink(&store, "orders", "other", "orders")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatcherError::DuplicateSink { .. }));
        assert_eq!(registry.targets().len(), 1);
    }
}
