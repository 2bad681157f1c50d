//! Threshold evaluation of a cycle snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

use inferwatch_core::config::ThresholdsConfig;
use inferwatch_core::{Dimension, MetricsSnapshot, Status, ThresholdPair};

/// Alert severity. There is no "info" alert: below warning nothing fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Severity> for Status {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Warning => Status::Warning,
            Severity::Critical => Status::Critical,
        }
    }
}

/// An alert that crossed its threshold this cycle, before cooldown gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAlert {
    pub dimension: Dimension,
    pub severity: Severity,
    pub message: String,
    pub observed_value: f64,
    pub threshold_value: f64,
}

/// How a value is compared against its thresholds.
#[derive(Debug, Clone, Copy)]
enum Compare {
    /// `value > threshold`, for continuous measurements.
    Above,
    /// `value >= threshold`, for integer counts.
    AtLeast,
}

impl Compare {
    fn check<T: PartialOrd>(self, value: T, threshold: T) -> bool {
        match self {
            Compare::Above => value > threshold,
            Compare::AtLeast => value >= threshold,
        }
    }
}

/// Critical takes precedence; returns the breached severity and its threshold.
fn classify<T: PartialOrd + Copy>(
    value: T,
    pair: &ThresholdPair<T>,
    compare: Compare,
) -> Option<(Severity, T)> {
    if compare.check(value, pair.critical) {
        Some((Severity::Critical, pair.critical))
    } else if compare.check(value, pair.warning) {
        Some((Severity::Warning, pair.warning))
    } else {
        None
    }
}

/// Evaluate all dimensions of `snapshot`.
///
/// At most one alert per dimension, in the order response time, p95
/// latency, error rate, consecutive failures, health status.
pub fn evaluate(snapshot: &MetricsSnapshot, thresholds: &ThresholdsConfig) -> Vec<CandidateAlert> {
    let mut alerts = Vec::new();

    let continuous = [
        (
            Dimension::ResponseTime,
            snapshot.avg_latency_ms,
            &thresholds.response_time_ms,
        ),
        (
            Dimension::P95Latency,
            snapshot.p95_latency_ms,
            &thresholds.p95_latency_ms,
        ),
        (
            Dimension::ErrorRate,
            snapshot.error_rate_pct,
            &thresholds.error_rate_percent,
        ),
    ];
    for (dimension, value, pair) in continuous {
        if let Some((severity, threshold)) = classify(value, pair, Compare::Above) {
            alerts.push(CandidateAlert {
                dimension,
                severity,
                message: message(dimension, severity, value),
                observed_value: value,
                threshold_value: threshold,
            });
        }
    }

    let failures = snapshot.consecutive_failures;
    if let Some((severity, threshold)) =
        classify(failures, &thresholds.consecutive_failures, Compare::AtLeast)
    {
        alerts.push(CandidateAlert {
            dimension: Dimension::ConsecutiveFailures,
            severity,
            message: message(Dimension::ConsecutiveFailures, severity, failures as f64),
            observed_value: failures as f64,
            threshold_value: threshold as f64,
        });
    }

    if !snapshot.service_healthy {
        alerts.push(CandidateAlert {
            dimension: Dimension::HealthStatus,
            severity: Severity::Critical,
            message: message(Dimension::HealthStatus, Severity::Critical, 0.0),
            observed_value: 0.0,
            threshold_value: 1.0,
        });
    }

    alerts
}

/// Status attached to the cycle's metric records.
///
/// Error rate is checked first, then average latency and consecutive
/// failures. p95 latency and health status are not folded in.
pub fn overall_status(snapshot: &MetricsSnapshot, thresholds: &ThresholdsConfig) -> Status {
    let error_rate = classify(
        snapshot.error_rate_pct,
        &thresholds.error_rate_percent,
        Compare::Above,
    )
    .map(|(s, _)| s);
    let latency = classify(
        snapshot.avg_latency_ms,
        &thresholds.response_time_ms,
        Compare::Above,
    )
    .map(|(s, _)| s);
    let failures = classify(
        snapshot.consecutive_failures,
        &thresholds.consecutive_failures,
        Compare::AtLeast,
    )
    .map(|(s, _)| s);

    [error_rate, latency, failures]
        .into_iter()
        .flatten()
        .max()
        .map(Status::from)
        .unwrap_or(Status::Normal)
}

fn message(dimension: Dimension, severity: Severity, value: f64) -> String {
    let level = match severity {
        Severity::Critical => "critical",
        Severity::Warning => "high",
    };
    match dimension {
        Dimension::ResponseTime => format!("{level} response time: {value:.2}ms"),
        Dimension::P95Latency => format!("{level} p95 latency: {value:.2}ms"),
        Dimension::ErrorRate => format!("{level} error rate: {value:.2}%"),
        Dimension::ConsecutiveFailures => {
            format!("{level} consecutive failure count: {}", value as u64)
        }
        Dimension::HealthStatus => "service unavailable".to_string(),
    }
}
