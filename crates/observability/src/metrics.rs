//! Sink request metrics
//!
//! Thin wrappers over the `metrics` facade so metric names live in one place.
//! Without an installed recorder every call is a no-op.

use metrics::{counter, histogram};

/// Request kind label values
pub const KIND_NDJSON: &str = "ndjson";
pub const KIND_RESOLVED: &str = "resolved";
pub const KIND_UNRECOGNIZED: &str = "unrecognized";

/// Record one classified request
pub fn record_request(kind: &'static str) {
    counter!("cdc_sink_requests_total", "kind" => kind).increment(1);
}

/// Record a path that matched neither grammar
pub fn record_unrecognized_url() {
    record_request(KIND_UNRECOGNIZED);
    counter!("cdc_sink_unrecognized_urls_total").increment(1);
}

/// Record an ndjson path whose topic has no registered sink
pub fn record_missing_sink(topic: &str) {
    counter!("cdc_sink_missing_sink_total", "topic" => topic.to_string()).increment(1);
}

/// Record the outcome of one scanned batch
pub fn record_batch(topic: &str, written: u64, failed: u64) {
    counter!("cdc_sink_batches_total", "topic" => topic.to_string()).increment(1);
    counter!("cdc_sink_records_written_total", "topic" => topic.to_string()).increment(written);
    if failed > 0 {
        counter!("cdc_sink_record_failures_total", "topic" => topic.to_string())
            .increment(failed);
    }
    histogram!("cdc_sink_batch_records", "topic" => topic.to_string())
        .record((written + failed) as f64);
}

/// Record an applied resolved checkpoint
pub fn record_checkpoint(applied: usize, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("cdc_sink_checkpoints_total", "status" => status).increment(1);
    if success {
        counter!("cdc_sink_mutations_applied_total").increment(applied as u64);
    }
}
