//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{QualifiedTable, SinkerBlueprint};

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    server: ServerInfo,
    store: StoreInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct ServerInfo {
    host: String,
    port: u16,
}

#[derive(Serialize)]
struct StoreInfo {
    backend: String,
    sink_db: String,
    drop: bool,
    tables: Vec<String>,
}

#[derive(Serialize)]
struct SinkInfo {
    source_table: String,
    /// Topic the sink is found under
    registry_key: String,
    destination: String,
    staging: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn sink_infos(blueprint: &SinkerBlueprint) -> Vec<SinkInfo> {
    blueprint
        .sinks
        .iter()
        .map(|s| {
            let destination = QualifiedTable::new(&s.destination_db, &s.destination_table);
            let staging = QualifiedTable::staging_for(&blueprint.store.sink_db, &destination);
            SinkInfo {
                source_table: s.source_table.clone(),
                registry_key: s.destination_table.to_lowercase(),
                destination: destination.to_string(),
                staging: staging.to_string(),
            }
        })
        .collect()
}

fn build_config_info(blueprint: &SinkerBlueprint, args: &InfoArgs) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        server: ServerInfo {
            host: blueprint.server.host.clone(),
            port: blueprint.server.port,
        },
        store: StoreInfo {
            backend: format!("{:?}", blueprint.store.backend),
            sink_db: blueprint.store.sink_db.clone(),
            drop: blueprint.store.drop,
            tables: blueprint.store.tables.clone(),
        },
        sinks: if args.sinks {
            sink_infos(blueprint)
        } else {
            Vec::new()
        },
    }
}

fn print_config_info(blueprint: &SinkerBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  CDC Sink Configuration                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🌐 Server");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!(
        "   └─ Listen: {}:{}",
        blueprint.server.host, blueprint.server.port
    );

    let store = &blueprint.store;
    println!("\n🗄  Store");
    println!("   ├─ Backend: {:?}", store.backend);
    println!("   ├─ Sink database: {}", store.sink_db);
    println!("   ├─ Drop on start: {}", store.drop);
    println!("   └─ Tables ({})", store.tables.len());

    if blueprint.sinks.is_empty() {
        println!("\n📥 Sinks (0)");
    } else if args.sinks {
        let sinks = sink_infos(blueprint);
        println!("\n📥 Sinks ({})", sinks.len());
        for (i, sink) in sinks.iter().enumerate() {
            let is_last = i == sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let child_prefix = if is_last { "   " } else { "│  " };
            println!("   {} {}", prefix, sink.registry_key);
            println!("   {}  ├─ Source: {}", child_prefix, sink.source_table);
            println!("   {}  ├─ Destination: {}", child_prefix, sink.destination);
            println!("   {}  └─ Staging: {}", child_prefix, sink.staging);
        }
    } else {
        println!("\n📥 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!(
                "   {} {} -> {}.{}",
                prefix, sink.source_table, sink.destination_db, sink.destination_table
            );
        }
    }

    println!();
}
