//! Per-cycle aggregation of probe samples.
//!
//! Latency statistics only look at successful samples; the error rate looks
//! at the whole batch. An empty batch counts as a 100% error rate.

use chrono::{DateTime, Utc};
use tracing::debug;

use inferwatch_core::{MetricsSnapshot, Sample};

/// Percentile used for the tail-latency metric.
const P95: f64 = 0.95;

/// Owns the failure counter carried from one cycle to the next.
#[derive(Debug, Default)]
pub struct Aggregator {
    consecutive_failures: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously observed counter value.
    pub fn with_consecutive_failures(consecutive_failures: u64) -> Self {
        Self {
            consecutive_failures,
        }
    }

    /// Failed samples accumulated since the last clean cycle.
    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures
    }

    /// Aggregate one cycle's batch and update the carried counter.
    pub fn aggregate(
        &mut self,
        samples: &[Sample],
        service_healthy: bool,
        observed_at: DateTime<Utc>,
    ) -> MetricsSnapshot {
        let (snapshot, counter) =
            aggregate(samples, self.consecutive_failures, service_healthy, observed_at);
        self.consecutive_failures = counter;
        snapshot
    }
}

/// Aggregate `samples` into a snapshot.
///
/// Returns the snapshot and the new failure counter: `prior + failures`
/// when the batch had any failure, otherwise 0.
pub fn aggregate(
    samples: &[Sample],
    prior_consecutive_failures: u64,
    service_healthy: bool,
    observed_at: DateTime<Utc>,
) -> (MetricsSnapshot, u64) {
    let mut latencies: Vec<f64> = samples
        .iter()
        .filter(|s| s.success)
        .map(|s| s.latency_ms)
        .collect();
    latencies.sort_by(|a, b| a.total_cmp(b));

    let total = samples.len() as u64;
    let success_count = latencies.len() as u64;
    let failure_count = total - success_count;

    let avg_latency_ms = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<f64>() / latencies.len() as f64
    };

    let error_rate_pct = if total > 0 {
        failure_count as f64 / total as f64 * 100.0
    } else {
        100.0
    };

    let consecutive_failures = if failure_count > 0 {
        prior_consecutive_failures + failure_count
    } else {
        0
    };

    debug!(
        total,
        failures = failure_count,
        consecutive_failures,
        "cycle aggregated"
    );

    let snapshot = MetricsSnapshot {
        observed_at,
        avg_latency_ms,
        p95_latency_ms: percentile(&latencies, P95),
        error_rate_pct,
        total_samples: total,
        success_count,
        failure_count,
        consecutive_failures,
        service_healthy,
    };
    (snapshot, consecutive_failures)
}

/// Nearest-rank percentile of an ascending slice.
///
/// Index is `floor(q * n)` clamped to the last element; an empty slice
/// yields 0.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (q * sorted.len() as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}
