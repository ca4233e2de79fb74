use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing batch activity.
#[derive(Default)]
pub struct PipelineMetrics {
    batches_completed: AtomicU64,
    documents_succeeded: AtomicU64,
    documents_failed: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed batch and its per-document tallies.
    pub fn record_batch(&self, succeeded: u64, failed: u64) {
        self.batches_completed.fetch_add(1, Ordering::Relaxed);
        self.documents_succeeded
            .fetch_add(succeeded, Ordering::Relaxed);
        self.documents_failed.fetch_add(failed, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_completed: self.batches_completed.load(Ordering::Relaxed),
            documents_succeeded: self.documents_succeeded.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of batch counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of batches that have run to their barrier since startup.
    pub batches_completed: u64,
    /// Documents that completed the full per-document pipeline.
    pub documents_succeeded: u64,
    /// Documents that failed at some pipeline stage.
    pub documents_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_batches_and_documents() {
        let metrics = PipelineMetrics::new();
        metrics.record_batch(2, 1);
        metrics.record_batch(3, 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches_completed, 2);
        assert_eq!(snapshot.documents_succeeded, 5);
        assert_eq!(snapshot.documents_failed, 1);
    }

    #[test]
    fn snapshot_starts_at_zero() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.snapshot().batches_completed, 0);
        assert_eq!(metrics.snapshot().documents_failed, 0);
    }
}
