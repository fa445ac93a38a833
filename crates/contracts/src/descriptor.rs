//! Request descriptors - URL Classifier output
//!
//! Immutable values built once per classified request path and consumed
//! immediately by the dispatcher.

use crate::{Timestamp, TopicName};

/// File uniquer emitted by the changefeed writer: `{session}-{node}-{sink}-{file}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uniquer {
    session_id: String,
    node_id: u64,
    sink_id: u64,
    file_id: u64,
}

impl Uniquer {
    /// Create a uniquer; the session token is folded to lower case.
    pub fn new(session_id: &str, node_id: u64, sink_id: u64, file_id: u64) -> Self {
        Self {
            session_id: session_id.to_lowercase(),
            node_id,
            sink_id,
            file_id,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    pub fn sink_id(&self) -> u64 {
        self.sink_id
    }

    pub fn file_id(&self) -> u64 {
        self.file_id
    }
}

/// A row-mutation batch file:
/// `/{date}/{timestamp}-{session}-{node}-{sink}-{file}-{topic}-{schema_id}.ndjson`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdjsonDescriptor {
    date: String,
    timestamp: Timestamp,
    uniquer: Uniquer,
    topic: TopicName,
    schema_id: u64,
}

impl NdjsonDescriptor {
    /// Create a descriptor; textual fields are folded to lower case.
    pub fn new(
        date: &str,
        timestamp: Timestamp,
        uniquer: Uniquer,
        topic: &str,
        schema_id: u64,
    ) -> Self {
        Self {
            date: date.to_lowercase(),
            timestamp,
            uniquer,
            topic: TopicName::new(topic),
            schema_id,
        }
    }

    /// Date directory, `YYYY-MM-DD`
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    pub fn uniquer(&self) -> &Uniquer {
        &self.uniquer
    }

    pub fn session_id(&self) -> &str {
        self.uniquer.session_id()
    }

    pub fn node_id(&self) -> u64 {
        self.uniquer.node_id()
    }

    pub fn sink_id(&self) -> u64 {
        self.uniquer.sink_id()
    }

    pub fn file_id(&self) -> u64 {
        self.uniquer.file_id()
    }

    pub fn topic(&self) -> &TopicName {
        &self.topic
    }

    pub fn schema_id(&self) -> u64 {
        self.schema_id
    }
}

/// A resolved checkpoint file: `{endpoint}/{date}/{timestamp}.RESOLVED`
///
/// Everything up to `timestamp` has been delivered for the endpoint as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDescriptor {
    endpoint: String,
    date: String,
    timestamp: Timestamp,
}

impl ResolvedDescriptor {
    /// Create a descriptor; textual fields are folded to lower case.
    pub fn new(endpoint: &str, date: &str, timestamp: Timestamp) -> Self {
        Self {
            endpoint: endpoint.to_lowercase(),
            date: date.to_lowercase(),
            timestamp,
        }
    }

    /// Path prefix before the date directory, possibly empty
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }
}
