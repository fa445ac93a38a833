//! Dispatcher error types

use contracts::{ContractError, QualifiedTable, TopicName};
use ingestion::UnrecognizedUrl;
use thiserror::Error;

/// Dispatcher-specific errors
///
/// Every variant is terminal for the request or startup step that raised it.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Path matched neither the ndjson nor the resolved grammar
    #[error(transparent)]
    UnrecognizedUrl(#[from] UnrecognizedUrl),

    /// Ndjson path recognized but no sink is registered for its topic
    #[error("could not find a sink for {topic}")]
    NoSinkForTopic { topic: TopicName },

    /// Destination table missing at registration
    #[error("table {table} could not be found")]
    TableNotFound { table: QualifiedTable },

    /// A sink with the same key is already registered
    #[error("a sink for '{key}' is already registered")]
    DuplicateSink { key: TopicName },

    /// Storage failure while registering a sink
    #[error("failed to create sink '{name}': {source}")]
    SinkCreation {
        name: String,
        #[source]
        source: ContractError,
    },

    /// Checkpoint collaborator failed
    #[error("resolved checkpoint failed: {0}")]
    Checkpoint(#[source] ContractError),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, source: ContractError) -> Self {
        Self::SinkCreation {
            name: name.into(),
            source,
        }
    }
}
