//! SinkerBlueprint - Config Loader output
//!
//! Describes a complete sink process: listen address, storage, and the
//! changefeed tables routed to destination tables.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete sink process configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkerBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// HTTP listener
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,

    /// Storage collaborator settings
    #[serde(default)]
    #[validate(nested)]
    pub store: StoreConfig,

    /// Changefeed tables and where they land
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
}

/// Longest ndjson record accepted, newline excluded
pub const DEFAULT_MAX_RECORD_BYTES: usize = 64 * 1024;

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    #[validate(length(min = 1))]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Longest ndjson record buffered; longer records fail without being held
    #[serde(default = "default_max_record_bytes")]
    #[validate(range(min = 1))]
    pub max_record_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_record_bytes: default_max_record_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    26258
}

fn default_max_record_bytes() -> usize {
    DEFAULT_MAX_RECORD_BYTES
}

/// Storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local tables, lost on exit
    #[default]
    Memory,
}

/// Storage collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    /// Backend implementation
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database holding the staging tables
    #[serde(default = "default_sink_db")]
    #[validate(length(min = 1))]
    pub sink_db: String,

    /// Drop the sink database before starting
    #[serde(default)]
    pub drop: bool,

    /// Destination tables that exist up front (`db.table`), memory backend only
    #[serde(default)]
    pub tables: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            sink_db: default_sink_db(),
            drop: false,
            tables: Vec::new(),
        }
    }
}

fn default_sink_db() -> String {
    "_cdc_sink".to_string()
}

/// One changefeed table routed to one destination table
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Name of the source table sending data
    #[validate(length(min = 1))]
    pub source_table: String,

    /// Database of the receiving table
    #[serde(default = "default_destination_db")]
    #[validate(length(min = 1))]
    pub destination_db: String,

    /// Receiving table, must exist
    #[validate(length(min = 1))]
    pub destination_table: String,
}

fn default_destination_db() -> String {
    "defaultdb".to_string()
}
