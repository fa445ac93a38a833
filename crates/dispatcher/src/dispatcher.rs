//! Dispatcher - routes one delivery to a sink or the checkpoint handler

use std::sync::Arc;

use tokio::io::AsyncBufRead;
use tracing::{debug, info, instrument, warn};

use contracts::{
    CheckpointHandler, CheckpointOutcome, RecordDecoder, SinkConfig, StagingStore, TopicName,
};
use ingestion::{classify, Classified};
use observability::metrics as obs;

use crate::error::DispatcherError;
use crate::handle::BatchReport;
use crate::metrics::MetricsSnapshot;
use crate::registry::SinkRegistry;

/// What a successfully routed delivery produced
#[derive(Debug)]
pub enum DispatchOutcome {
    /// An ndjson batch was scanned into a staging table
    Batch { topic: TopicName, report: BatchReport },
    /// A resolved checkpoint was handed to the checkpoint handler
    Resolved(CheckpointOutcome),
}

/// Request dispatcher
///
/// Shared across requests behind an `Arc`; holds no per-request state.
pub struct Dispatcher<S, C, D> {
    registry: SinkRegistry,
    store: Arc<S>,
    checkpoints: Arc<C>,
    decoder: D,
}

impl<S, C, D> Dispatcher<S, C, D>
where
    S: StagingStore + Send + Sync,
    C: CheckpointHandler + Send + Sync,
    D: RecordDecoder,
{
    pub fn new(registry: SinkRegistry, store: Arc<S>, checkpoints: Arc<C>, decoder: D) -> Self {
        Self {
            registry,
            store,
            checkpoints,
            decoder,
        }
    }

    pub fn registry(&self) -> &SinkRegistry {
        &self.registry
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.registry
            .iter()
            .map(|(key, handle)| (key.to_string(), handle.metrics().snapshot()))
            .collect()
    }

    /// Route one delivery by its path.
    ///
    /// Ndjson batches go to the sink registered for the topic and the body is
    /// streamed into its staging table. Resolved checkpoints go to the
    /// checkpoint handler with every registered sink; their body is not read.
    #[instrument(name = "dispatcher_dispatch", skip(self, path, body), fields(path = %path))]
    pub async fn dispatch<R>(&self, path: &str, body: R) -> Result<DispatchOutcome, DispatcherError>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let classified = match classify(path) {
            Ok(classified) => classified,
            Err(e) => {
                obs::record_unrecognized_url();
                warn!(error = %e, "Unrecognized delivery path");
                return Err(e.into());
            }
        };

        match classified {
            Classified::Ndjson(batch) => {
                obs::record_request(obs::KIND_NDJSON);
                let topic = batch.topic().clone();
                let Some(handle) = self.registry.find_sink(topic.as_str()) else {
                    obs::record_missing_sink(topic.as_str());
                    warn!(topic = %topic, "No sink registered for topic");
                    return Err(DispatcherError::NoSinkForTopic { topic });
                };

                debug!(
                    topic = %topic,
                    timestamp = %batch.timestamp(),
                    file_id = batch.file_id(),
                    staging = %handle.staging(),
                    "Routing ndjson batch"
                );
                let report = handle
                    .handle_batch(self.store.as_ref(), &self.decoder, body)
                    .await;
                obs::record_batch(topic.as_str(), report.written, report.failed());

                Ok(DispatchOutcome::Batch { topic, report })
            }
            Classified::Resolved(resolved) => {
                obs::record_request(obs::KIND_RESOLVED);
                debug!(
                    endpoint = resolved.endpoint(),
                    timestamp = %resolved.timestamp(),
                    "Routing resolved checkpoint"
                );

                match self
                    .checkpoints
                    .handle_resolved(&resolved, self.registry.targets())
                    .await
                {
                    Ok(outcome) => {
                        obs::record_checkpoint(outcome.applied, true);
                        info!(
                            endpoint = resolved.endpoint(),
                            timestamp = %resolved.timestamp(),
                            applied = outcome.applied,
                            "Resolved checkpoint applied"
                        );
                        Ok(DispatchOutcome::Resolved(outcome))
                    }
                    Err(e) => {
                        obs::record_checkpoint(0, false);
                        Err(DispatcherError::Checkpoint(e))
                    }
                }
            }
        }
    }
}

/// Build a dispatcher: register every configured sink, then freeze the registry
#[instrument(
    name = "dispatcher_create",
    skip(sinks, store, checkpoints, decoder),
    fields(sink_count = sinks.len())
)]
pub async fn create_dispatcher<S, C, D>(
    sink_db: &str,
    sinks: &[SinkConfig],
    max_record_bytes: usize,
    store: Arc<S>,
    checkpoints: Arc<C>,
    decoder: D,
) -> Result<Dispatcher<S, C, D>, DispatcherError>
where
    S: StagingStore + Send + Sync,
    C: CheckpointHandler + Send + Sync,
    D: RecordDecoder,
{
    let mut registry = SinkRegistry::new(sink_db).with_max_record_bytes(max_record_bytes);
    for sink in sinks {
        registry
            .add_sink(
                store.as_ref(),
                &sink.source_table,
                &sink.destination_db,
                &sink.destination_table,
            )
            .await?;
    }
    info!(sinks = registry.len(), "Sink registry ready");

    Ok(Dispatcher::new(registry, store, checkpoints, decoder))
}
