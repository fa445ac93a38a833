//! # Dispatcher
//!
//! Request routing for changefeed deliveries.
//!
//! Responsibilities:
//! - Hold the sink registry (topic -> destination/staging tables)
//! - Stream ndjson batches into staging tables, record by record
//! - Forward resolved checkpoints to the checkpoint handler

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod registry;

#[cfg(test)]
mod testing;

pub use contracts::{CheckpointHandler, CheckpointOutcome, RecordDecoder, StagingStore};
pub use dispatcher::{create_dispatcher, DispatchOutcome, Dispatcher};
pub use error::DispatcherError;
pub use handle::{BatchReport, RecordFailure, SinkHandle};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use registry::SinkRegistry;
