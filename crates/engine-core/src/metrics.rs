use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    rows_pulled: AtomicU64,
    rows_skipped: AtomicU64,
    rows_written: AtomicU64,
    batches_written: AtomicU64,
}

/// Row and batch counters of a run. Clones share the same counters, so a
/// caller can observe a run while it is in progress.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Rows read from the source, including those outside the window.
    pub rows_pulled: u64,
    /// Rows dropped by the transform.
    pub rows_skipped: u64,
    pub rows_written: u64,
    pub batches_written: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_pulled(&self) {
        self.inner.rows_pulled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_skipped(&self) {
        self.inner.rows_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch(&self, rows: u64) {
        self.inner.rows_written.fetch_add(rows, Ordering::Relaxed);
        self.inner.batches_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_pulled: self.inner.rows_pulled.load(Ordering::Relaxed),
            rows_skipped: self.inner.rows_skipped.load(Ordering::Relaxed),
            rows_written: self.inner.rows_written.load(Ordering::Relaxed),
            batches_written: self.inner.batches_written.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
