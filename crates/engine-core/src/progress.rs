use serde::Serialize;
use std::{
    fmt,
    time::{Duration, Instant},
};

/// Number of fraction digits worth showing for a duration in seconds.
pub fn fraction_digits(seconds: f64) -> usize {
    if seconds == 0.0 {
        0
    } else if seconds < 0.001 {
        6
    } else if seconds < 0.01 {
        5
    } else if seconds < 0.1 {
        4
    } else if seconds < 1.0 {
        3
    } else if seconds < 10.0 {
        2
    } else {
        0
    }
}

pub fn format_seconds(seconds: f64) -> String {
    format!("{:.*}", fraction_digits(seconds), seconds)
}

/// Whole rows per second, or `?` when the rate is indeterminate.
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{rate:.0}"),
        None => "?".to_string(),
    }
}

pub fn plural_rows(count: u64) -> &'static str {
    if count <= 1 { "row" } else { "rows" }
}

fn rate(rows: u64, seconds: f64) -> Option<f64> {
    (seconds > 0.0).then(|| rows as f64 / seconds)
}

/// Throughput after one flush.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressReport {
    pub row_count: u64,
    pub round_rows: u64,
    pub round_rate: Option<f64>,
    pub total_rate: Option<f64>,
    pub elapsed_secs: f64,
    /// Estimated seconds left, known when both the total and the rate are.
    pub eta_secs: Option<f64>,
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} ={}", self.round_rows, self.row_count)?;
        if let Some(total_rate) = self.total_rate {
            write!(f, " ={total_rate:.0}/s")?;
        }
        write!(f, " +{}/s", format_rate(self.round_rate))?;
        write!(f, ", past {:.0}s", self.elapsed_secs)?;
        if let Some(eta) = self.eta_secs {
            write!(f, ", need {eta:.0}s, total {:.0}s", self.elapsed_secs + eta)?;
        }
        Ok(())
    }
}

/// Computes round and overall rates between flushes.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    started: Instant,
    last_time: Instant,
    last_row_count: u64,
    total_rate: Option<f64>,
}

impl ProgressTracker {
    pub fn start() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(now: Instant) -> Self {
        ProgressTracker {
            started: now,
            last_time: now,
            last_row_count: 0,
            total_rate: None,
        }
    }

    pub fn last_row_count(&self) -> u64 {
        self.last_row_count
    }

    /// Overall rate as of the latest snapshot.
    pub fn total_rate(&self) -> Option<f64> {
        self.total_rate
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn snapshot(&mut self, row_count: u64, total_rows: Option<u64>) -> ProgressReport {
        self.snapshot_at(Instant::now(), row_count, total_rows)
    }

    pub fn snapshot_at(
        &mut self,
        now: Instant,
        row_count: u64,
        total_rows: Option<u64>,
    ) -> ProgressReport {
        let round_secs = now.saturating_duration_since(self.last_time).as_secs_f64();
        let elapsed_secs = now.saturating_duration_since(self.started).as_secs_f64();
        let round_rows = row_count.saturating_sub(self.last_row_count);

        let round_rate = rate(round_rows, round_secs);
        let total_rate = rate(row_count, elapsed_secs);
        let eta_secs = match (total_rows, total_rate) {
            (Some(total), Some(rate)) if total > 0 && rate > 0.0 => {
                Some((total.saturating_sub(row_count)) as f64 / rate)
            }
            _ => None,
        };

        self.last_time = now;
        self.last_row_count = row_count;
        self.total_rate = total_rate;

        ProgressReport {
            row_count,
            round_rows,
            round_rate,
            total_rate,
            elapsed_secs,
            eta_secs,
        }
    }
}
