// Batch Aggregator Metrics
//
// Counts batch operations, readiness notices and optimistic-update conflicts,
// and times each operation to flag slow ones.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

/// Performance threshold for slow operations (50ms)
const SLOW_OPERATION_THRESHOLD_MS: u128 = 50;

/// Operation counters for the batch aggregator
#[derive(Debug, Clone)]
pub struct BatchMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    assignments: AtomicU64,
    removals: AtomicU64,
    transitions: AtomicU64,
    driver_assignments: AtomicU64,
    ready_events: AtomicU64,
    batches_created: AtomicU64,
    batches_deleted: AtomicU64,

    // Optimistic concurrency
    conflict_retries: AtomicU64,
    conflicts_exhausted: AtomicU64,

    // Timing (microseconds)
    total_operation_time_us: AtomicU64,
    timed_operations: AtomicU64,
    slow_operations: AtomicU64,
}

impl BatchMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub fn record_assignment(&self) {
        self.inner.assignments.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removal(&self) {
        self.inner.removals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition(&self) {
        self.inner.transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_driver_assignment(&self) {
        self.inner.driver_assignments.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ready(&self) {
        self.inner.ready_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_created(&self) {
        self.inner.batches_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_deleted(&self) {
        self.inner.batches_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_conflict_retry(&self) {
        self.inner.conflict_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_conflict_exhausted(&self) {
        self.inner.conflicts_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    /// Start timing a batch operation; the duration is recorded on drop
    pub fn start_operation(&self, name: &'static str) -> OperationTimer {
        OperationTimer {
            start: Instant::now(),
            name,
            metrics: self.clone(),
        }
    }

    fn record_duration(&self, name: &str, duration: Duration) {
        self.inner.timed_operations.fetch_add(1, Ordering::Relaxed);
        self.inner
            .total_operation_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if duration.as_millis() > SLOW_OPERATION_THRESHOLD_MS {
            self.inner.slow_operations.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Slow batch operation {}: {}ms", name, duration.as_millis());
        }
    }

    /// Average operation time in milliseconds
    pub fn avg_operation_time_ms(&self) -> f64 {
        let count = self.inner.timed_operations.load(Ordering::Relaxed);
        let total_us = self.inner.total_operation_time_us.load(Ordering::Relaxed);

        if count == 0 {
            0.0
        } else {
            (total_us as f64 / count as f64) / 1000.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            assignments: self.inner.assignments.load(Ordering::Relaxed),
            removals: self.inner.removals.load(Ordering::Relaxed),
            transitions: self.inner.transitions.load(Ordering::Relaxed),
            driver_assignments: self.inner.driver_assignments.load(Ordering::Relaxed),
            ready_events: self.inner.ready_events.load(Ordering::Relaxed),
            batches_created: self.inner.batches_created.load(Ordering::Relaxed),
            batches_deleted: self.inner.batches_deleted.load(Ordering::Relaxed),
            conflict_retries: self.inner.conflict_retries.load(Ordering::Relaxed),
            conflicts_exhausted: self.inner.conflicts_exhausted.load(Ordering::Relaxed),
            avg_operation_time_ms: self.avg_operation_time_ms(),
            slow_operations: self.inner.slow_operations.load(Ordering::Relaxed),
        }
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        tracing::info!(
            "Batch metrics: {} assignments, {} removals, {} transitions, {} ready, \
             {} conflict retries ({} exhausted), avg {:.2}ms, {} slow",
            summary.assignments,
            summary.removals,
            summary.transitions,
            summary.ready_events,
            summary.conflict_retries,
            summary.conflicts_exhausted,
            summary.avg_operation_time_ms,
            summary.slow_operations,
        );
    }
}

impl Default for BatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer for tracking operation duration
pub struct OperationTimer {
    start: Instant,
    name: &'static str,
    metrics: BatchMetrics,
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        self.metrics.record_duration(self.name, self.start.elapsed());
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MetricsSummary {
    pub assignments: u64,
    pub removals: u64,
    pub transitions: u64,
    pub driver_assignments: u64,
    pub ready_events: u64,
    pub batches_created: u64,
    pub batches_deleted: u64,
    pub conflict_retries: u64,
    pub conflicts_exhausted: u64,
    pub avg_operation_time_ms: f64,
    pub slow_operations: u64,
}
