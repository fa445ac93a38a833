//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Sink database setup failed
    #[error("Failed to prepare sink database '{database}': {source}")]
    SinkDatabase {
        database: String,
        #[source]
        source: contracts::ContractError,
    },

    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP server stopped with an error
    #[error("HTTP server failed: {0}")]
    Serve(#[source] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn sink_database(database: impl Into<String>, source: contracts::ContractError) -> Self {
        Self::SinkDatabase {
            database: database.into(),
            source,
        }
    }

    pub fn bind(addr: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }
}
