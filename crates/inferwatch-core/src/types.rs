//! Records passed between the prober, aggregator and alerting stages.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single outbound probe call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Request path the probe was sent to (e.g. `/health`).
    pub endpoint: String,
    /// End-to-end elapsed time, connection setup included.
    pub latency_ms: f64,
    /// HTTP status, or 0 when the request never completed.
    pub status_code: u16,
    pub success: bool,
    pub observed_at: DateTime<Utc>,
}

impl Sample {
    /// Sample for a request that failed below the HTTP layer.
    pub fn transport_failure(endpoint: &str, latency_ms: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            latency_ms,
            status_code: 0,
            success: false,
            observed_at,
        }
    }
}

/// Aggregated metrics for all samples gathered in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub observed_at: DateTime<Utc>,
    /// Mean latency of successful samples (0 when none succeeded).
    pub avg_latency_ms: f64,
    /// Nearest-rank p95 of successful latencies (0 when none succeeded).
    pub p95_latency_ms: f64,
    /// Failed share of the batch in percent; 100 for an empty batch.
    pub error_rate_pct: f64,
    pub total_samples: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Failed samples accumulated since the last clean cycle.
    pub consecutive_failures: u64,
    /// Result of the dedicated health probe for the cycle.
    pub service_healthy: bool,
}

/// Lower/upper alerting bounds for one monitored dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair<T> {
    pub warning: T,
    pub critical: T,
}

impl<T: PartialOrd> ThresholdPair<T> {
    pub fn new(warning: T, critical: T) -> Self {
        Self { warning, critical }
    }

    /// Whether the pair is ordered (`warning <= critical`).
    pub fn is_ordered(&self) -> bool {
        self.warning <= self.critical
    }
}

/// Status attached to metric records and to the overall cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Normal,
    Warning,
    Critical,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Normal => "normal",
            Status::Warning => "warning",
            Status::Critical => "critical",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Normal => "🟢",
            Status::Warning => "🟡",
            Status::Critical => "🔴",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A monitored quantity that can raise alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    ResponseTime,
    P95Latency,
    ErrorRate,
    ConsecutiveFailures,
    HealthStatus,
}

impl Dimension {
    /// All dimensions in evaluation order.
    pub const ALL: [Dimension; 5] = [
        Dimension::ResponseTime,
        Dimension::P95Latency,
        Dimension::ErrorRate,
        Dimension::ConsecutiveFailures,
        Dimension::HealthStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::ResponseTime => "response_time",
            Dimension::P95Latency => "p95_latency",
            Dimension::ErrorRate => "error_rate",
            Dimension::ConsecutiveFailures => "consecutive_failures",
            Dimension::HealthStatus => "health_status",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
