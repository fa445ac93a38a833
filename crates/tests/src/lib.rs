//! # Integration Tests
//!
//! Cross-crate end-to-end tests.
//!
//! Covers:
//! - configuration -> registry -> dispatch -> staging
//! - resolved checkpoints applying staged mutations to destination tables

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{QualifiedTable, SinkerBlueprint, StagingStore};
    use dispatcher::{create_dispatcher, DispatchOutcome, Dispatcher, DispatcherError};
    use ingestion::JsonRecordDecoder;
    use staging::MemoryStore;

    const CONFIG: &str = r#"
[store]
sink_db = "_cdc_sink"
tables = ["defaultdb.orders", "defaultdb.users", "archive.orders_copy"]

[[sinks]]
source_table = "orders"
destination_table = "orders"

[[sinks]]
source_table = "users"
destination_table = "users"

[[sinks]]
source_table = "orders_v1"
destination_db = "archive"
destination_table = "orders_copy"
"#;

    const ORDERS_BATCH: &str = "/2020-04-02/202004022058072107140000000000000-56087568dba1e6b8-1-72-00000000-orders-1.ndjson";
    const USERS_BATCH: &str = "/2020-04-02/202004022058072107140000000000000-56087568dba1e6b8-1-72-00000001-USERS-1.ndjson";

    type SinkDispatcher = Dispatcher<MemoryStore, MemoryStore, JsonRecordDecoder>;

    fn record(id: u32, nanos: u64, after: bool) -> String {
        let after = if after {
            format!(r#"{{"id": {id}}}"#)
        } else {
            "null".to_string()
        };
        format!(r#"{{"after": {after}, "key": [{id}], "updated": "{nanos}.0000000000"}}"#)
    }

    fn resolved(datetime: &str) -> String {
        format!("/test/2020-04-02/{datetime}0000000000.RESOLVED")
    }

    /// Build the same stack `cdc-sink run` builds
    async fn start(blueprint: &SinkerBlueprint) -> (Arc<MemoryStore>, SinkDispatcher) {
        let store = Arc::new(MemoryStore::with_tables(
            blueprint
                .store
                .tables
                .iter()
                .filter_map(|t| QualifiedTable::parse(t)),
        ));
        store.create_sink_db(&blueprint.store.sink_db).await.unwrap();

        let dispatcher = create_dispatcher(
            &blueprint.store.sink_db,
            &blueprint.sinks,
            blueprint.server.max_record_bytes,
            store.clone(),
            store.clone(),
            JsonRecordDecoder,
        )
        .await
        .unwrap();
        (store, dispatcher)
    }

    fn table(db: &str, name: &str) -> QualifiedTable {
        QualifiedTable::new(db, name)
    }

    /// End-to-end: config -> batches -> resolved -> destination rows
    #[tokio::test]
    async fn test_e2e_batches_then_checkpoint() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let (store, dispatcher) = start(&blueprint).await;
        assert_eq!(dispatcher.registry().len(), 3);

        // 20:58:07 and 20:58:09, one malformed line in between
        let body = format!(
            "{}\n{}\n{{broken\n{}\n",
            record(1, 1585861087210714000, true),
            record(2, 1585861087210714000, true),
            record(3, 1585861089210714000, true),
        );
        let outcome = dispatcher
            .dispatch(ORDERS_BATCH, body.as_bytes())
            .await
            .unwrap();
        let DispatchOutcome::Batch { topic, report } = outcome else {
            panic!("expected a batch outcome");
        };
        assert_eq!(topic.as_str(), "orders");
        assert_eq!(report.scanned, 4);
        assert_eq!(report.written, 3);
        assert_eq!(report.failures[0].line, 3);

        // Topic matching is case-insensitive
        let body = record(10, 1585861087210714000, true);
        dispatcher
            .dispatch(USERS_BATCH, body.as_bytes())
            .await
            .unwrap();

        // Nothing reaches a destination before a resolved checkpoint
        assert!(store
            .rows(&table("defaultdb", "orders"))
            .await
            .unwrap()
            .is_empty());

        // Resolved at 20:58:08 applies everything at 20:58:07
        let outcome = dispatcher
            .dispatch(&resolved("20200402205808000000000"), &b""[..])
            .await
            .unwrap();
        let DispatchOutcome::Resolved(checkpoint) = outcome else {
            panic!("expected a resolved outcome");
        };
        assert_eq!(checkpoint.applied, 3);

        let orders = store.rows(&table("defaultdb", "orders")).await.unwrap();
        let keys: Vec<_> = orders.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["[1]", "[2]"]);
        assert_eq!(
            store.rows(&table("defaultdb", "users")).await.unwrap().len(),
            1
        );
        assert_eq!(
            store
                .staged_len(&table("_cdc_sink", "defaultdb_orders"))
                .await,
            Some(1)
        );

        // A later checkpoint picks up the rest, and a delete
        let body = record(1, 1585861089310714000, false);
        dispatcher
            .dispatch(ORDERS_BATCH, body.as_bytes())
            .await
            .unwrap();
        let outcome = dispatcher
            .dispatch(&resolved("20200402205810000000000"), &b""[..])
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            DispatchOutcome::Resolved(checkpoint) if checkpoint.applied == 2
        ));

        let orders = store.rows(&table("defaultdb", "orders")).await.unwrap();
        let keys: Vec<_> = orders.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["[2]", "[3]"]);
    }

    /// Sinks are keyed by destination table, so a renamed destination is
    /// only reachable through its destination name
    #[tokio::test]
    async fn test_e2e_registration_key_is_destination_table() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let (store, dispatcher) = start(&blueprint).await;

        let by_source = ORDERS_BATCH.replace("-orders-", "-orders_v1-");
        let err = dispatcher
            .dispatch(&by_source, &b""[..])
            .await
            .unwrap_err();
        assert!(matches!(err, DispatcherError::NoSinkForTopic { .. }));

        let by_destination = ORDERS_BATCH.replace("-orders-", "-orders_copy-");
        let body = record(7, 1585861087210714000, true);
        dispatcher
            .dispatch(&by_destination, body.as_bytes())
            .await
            .unwrap();
        assert_eq!(
            store
                .staged_len(&table("_cdc_sink", "archive_orders_copy"))
                .await,
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_e2e_unrecognized_path_touches_nothing() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let (store, dispatcher) = start(&blueprint).await;

        let body = record(1, 1585861087210714000, true);
        let err = dispatcher
            .dispatch("/2020-04-02/not-a-timestamp.ndjson", body.as_bytes())
            .await
            .unwrap_err();

        assert!(matches!(err, DispatcherError::UnrecognizedUrl(_)));
        assert_eq!(
            store
                .staged_len(&table("_cdc_sink", "defaultdb_orders"))
                .await,
            Some(0)
        );
    }

    #[tokio::test]
    async fn test_e2e_missing_destination_fails_startup() {
        let mut blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        blueprint.store.tables.pop();

        let store = Arc::new(MemoryStore::with_tables(
            blueprint
                .store
                .tables
                .iter()
                .filter_map(|t| QualifiedTable::parse(t)),
        ));
        store.create_sink_db("_cdc_sink").await.unwrap();

        let result = create_dispatcher(
            "_cdc_sink",
            &blueprint.sinks,
            blueprint.server.max_record_bytes,
            store.clone(),
            store,
            JsonRecordDecoder,
        )
        .await;
        assert!(matches!(result, Err(DispatcherError::TableNotFound { .. })));
    }
}
