//! Layered error definitions
//!
//! Categorized by source: config / record / storage / checkpoint

use thiserror::Error;

use crate::TimestampError;

/// Unified collaborator error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Record Errors =====
    /// A single ndjson record could not be decoded into a row mutation
    #[error("record decode error: {message}")]
    RecordDecode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A record longer than the configured limit; its bytes were skipped
    #[error("record of {len} bytes exceeds the {limit} byte limit")]
    RecordTooLarge { len: usize, limit: usize },

    /// The record's `updated` field is not a valid timestamp
    #[error("record timestamp error: {0}")]
    RecordTimestamp(#[from] TimestampError),

    // ===== Storage Errors =====
    /// Staging table write failed
    #[error("staging table '{table}' write error: {message}")]
    StagingWrite { table: String, message: String },

    /// Any other storage failure (DDL, connection)
    #[error("storage error: {message}")]
    Storage { message: String },

    // ===== Checkpoint Errors =====
    /// Applying a resolved checkpoint failed
    #[error("checkpoint error for endpoint '{endpoint}': {message}")]
    Checkpoint { endpoint: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create record decode error
    pub fn record_decode(message: impl Into<String>) -> Self {
        Self::RecordDecode {
            message: message.into(),
            source: None,
        }
    }

    /// Create oversized record error
    pub fn record_too_large(len: usize, limit: usize) -> Self {
        Self::RecordTooLarge { len, limit }
    }

    /// Create staging write error
    pub fn staging_write(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StagingWrite {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create checkpoint error
    pub fn checkpoint(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Checkpoint {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}
