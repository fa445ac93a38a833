//! `run` command implementation.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use contracts::{QualifiedTable, SinkerBlueprint, StagingStore};
use dispatcher::create_dispatcher;
use ingestion::JsonRecordDecoder;
use staging::MemoryStore;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::server;

/// Execute the `run` command
pub async fn run_server(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding listen host from CLI");
        blueprint.server.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding listen port from CLI");
        blueprint.server.port = port;
    }
    if args.drop {
        blueprint.store.drop = true;
    }

    info!(
        host = %blueprint.server.host,
        port = blueprint.server.port,
        sink_db = %blueprint.store.sink_db,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let store = Arc::new(prepare_store(&blueprint).await?);
    let dispatcher = create_dispatcher(
        &blueprint.store.sink_db,
        &blueprint.sinks,
        blueprint.server.max_record_bytes,
        store.clone(),
        store,
        JsonRecordDecoder,
    )
    .await
    .context("Failed to register sinks")?;

    let addr = format!("{}:{}", blueprint.server.host, blueprint.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| CliError::bind(addr.clone(), e))?;

    info!(addr = %addr, sinks = dispatcher.registry().len(), "Listening for changefeed deliveries");

    axum::serve(listener, server::router(Arc::new(dispatcher)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(CliError::Serve)?;

    info!("CDC sink finished");
    Ok(())
}

/// Seed destination tables, then (re)create the sink database
async fn prepare_store(blueprint: &SinkerBlueprint) -> Result<MemoryStore, CliError> {
    let store = MemoryStore::with_tables(
        blueprint
            .store
            .tables
            .iter()
            .filter_map(|t| QualifiedTable::parse(t)),
    );
    let sink_db = &blueprint.store.sink_db;

    if blueprint.store.drop {
        info!(sink_db = %sink_db, "Dropping sink database");
        store
            .drop_sink_db(sink_db)
            .await
            .map_err(|e| CliError::sink_database(sink_db, e))?;
    }
    store
        .create_sink_db(sink_db)
        .await
        .map_err(|e| CliError::sink_database(sink_db, e))?;

    Ok(store)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Received shutdown signal, stopping server...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &SinkerBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Server:");
    println!("  Listen: {}:{}", blueprint.server.host, blueprint.server.port);
    println!("  Max record: {} bytes", blueprint.server.max_record_bytes);
    println!("\nStore:");
    println!("  Backend: {:?}", blueprint.store.backend);
    println!("  Sink database: {}", blueprint.store.sink_db);
    println!("  Drop on start: {}", blueprint.store.drop);

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!(
                "  - {} -> {}.{}",
                sink.source_table, sink.destination_db, sink.destination_table
            );
        }
    }

    println!();
}
