//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single sink handle
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Batches handled
    batch_count: AtomicU64,
    /// Records written to staging
    write_count: AtomicU64,
    /// Records that failed to decode or write
    failure_count: AtomicU64,
    /// Batches cut short by a body read error
    read_error_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_count(&self) -> u64 {
        self.batch_count.load(Ordering::Relaxed)
    }

    pub fn inc_batch_count(&self) {
        self.batch_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn inc_write_count(&self) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read_error_count(&self) -> u64 {
        self.read_error_count.load(Ordering::Relaxed)
    }

    pub fn inc_read_error_count(&self) {
        self.read_error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batch_count: self.batch_count(),
            write_count: self.write_count(),
            failure_count: self.failure_count(),
            read_error_count: self.read_error_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batch_count: u64,
    pub write_count: u64,
    pub failure_count: u64,
    pub read_error_count: u64,
}
