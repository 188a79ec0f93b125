use engine_core::{
    metrics::MetricsSnapshot,
    progress::{format_rate, format_seconds, plural_rows},
};
use serde::Serialize;
use std::{fmt, time::Duration};

/// Outcome of a run that did not fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Rows handed to the sink or still buffered when the run ended.
    pub rows: u64,
    pub batches: u64,
    pub elapsed: Duration,
    /// Overall rate as of the last flush.
    pub total_rate: Option<f64>,
    /// The run was cancelled before the source was exhausted.
    pub interrupted: bool,
    pub last_step: String,
    pub metrics: MetricsSnapshot,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {} {}, {}s, {} rows/s",
            self.rows,
            plural_rows(self.rows),
            format_seconds(self.elapsed.as_secs_f64()),
            format_rate(self.total_rate)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(rows: u64, elapsed: Duration, total_rate: Option<f64>) -> RunSummary {
        RunSummary {
            rows,
            batches: 1,
            elapsed,
            total_rate,
            interrupted: false,
            last_step: "Process data".into(),
            metrics: MetricsSnapshot::default(),
        }
    }

    #[test]
    fn total_line() {
        assert_eq!(
            summary(1, Duration::from_millis(500), None).to_string(),
            "Total: 1 row, 0.500s, ? rows/s"
        );
        assert_eq!(
            summary(3000, Duration::from_secs(12), Some(250.0)).to_string(),
            "Total: 3000 rows, 12s, 250 rows/s"
        );
    }
}
