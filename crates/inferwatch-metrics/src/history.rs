//! Age-bounded history of raw samples and cycle snapshots.
//!
//! Informational only: alerting never reads from here. Entries are evicted
//! by [`HistoryStore::prune`], which the monitor calls once per cycle.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use inferwatch_core::{MetricsSnapshot, Sample};

pub struct HistoryStore {
    retention: Duration,
    samples: VecDeque<Sample>,
    snapshots: VecDeque<MetricsSnapshot>,
}

impl HistoryStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            samples: VecDeque::new(),
            snapshots: VecDeque::new(),
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn record_samples(&mut self, samples: &[Sample]) {
        self.samples.extend(samples.iter().cloned());
    }

    pub fn record_snapshot(&mut self, snapshot: MetricsSnapshot) {
        self.snapshots.push_back(snapshot);
    }

    /// Drop every entry observed at or before `now - retention`.
    ///
    /// Returns the number of samples and snapshots removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> (usize, usize) {
        let cutoff = now - self.retention;

        let samples_before = self.samples.len();
        self.samples.retain(|s| s.observed_at > cutoff);
        let snapshots_before = self.snapshots.len();
        self.snapshots.retain(|s| s.observed_at > cutoff);

        let removed = (
            samples_before - self.samples.len(),
            snapshots_before - self.snapshots.len(),
        );
        if removed != (0, 0) {
            debug!(
                samples = removed.0,
                snapshots = removed.1,
                %cutoff,
                "history pruned"
            );
        }
        removed
    }

    /// Most recent snapshot, if any.
    pub fn latest(&self) -> Option<&MetricsSnapshot> {
        self.snapshots.back()
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &MetricsSnapshot> {
        self.snapshots.iter()
    }

    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn snapshot_at(observed_at: DateTime<Utc>) -> MetricsSnapshot {
        MetricsSnapshot {
            observed_at,
            avg_latency_ms: 10.0,
            p95_latency_ms: 12.0,
            error_rate_pct: 0.0,
            total_samples: 3,
            success_count: 3,
            failure_count: 0,
            consecutive_failures: 0,
            service_healthy: true,
        }
    }

    fn sample_at(observed_at: DateTime<Utc>) -> Sample {
        Sample {
            endpoint: "/health".to_string(),
            latency_ms: 10.0,
            status_code: 200,
            success: true,
            observed_at,
        }
    }

    #[test]
    fn prune_drops_entries_older_than_retention() {
        let mut store = HistoryStore::new(Duration::hours(1));
        store.record_snapshot(snapshot_at(t0()));
        store.record_snapshot(snapshot_at(t0() + Duration::minutes(30)));

        let removed = store.prune(t0() + Duration::minutes(61));
        assert_eq!(removed, (0, 1));
        assert_eq!(store.snapshot_count(), 1);
        assert_eq!(
            store.latest().unwrap().observed_at,
            t0() + Duration::minutes(30)
        );
    }

    #[test]
    fn prune_excludes_entry_exactly_at_boundary() {
        let mut store = HistoryStore::new(Duration::hours(1));
        store.record_snapshot(snapshot_at(t0()));
        store.record_samples(&[sample_at(t0())]);

        store.prune(t0() + Duration::hours(1));
        assert_eq!(store.snapshot_count(), 0);
        assert_eq!(store.sample_count(), 0);
    }

    #[test]
    fn prune_keeps_entry_just_inside_window() {
        let mut store = HistoryStore::new(Duration::hours(1));
        store.record_snapshot(snapshot_at(t0() + Duration::seconds(1)));

        store.prune(t0() + Duration::hours(1));
        assert_eq!(store.snapshot_count(), 1);
    }

    #[test]
    fn samples_pruned_independently() {
        let mut store = HistoryStore::new(Duration::hours(1));
        store.record_samples(&[
            sample_at(t0()),
            sample_at(t0() + Duration::minutes(10)),
            sample_at(t0() + Duration::minutes(50)),
        ]);

        let removed = store.prune(t0() + Duration::minutes(75));
        assert_eq!(removed, (2, 0));
        assert_eq!(store.samples().count(), 1);
    }

    #[test]
    fn empty_store() {
        let mut store = HistoryStore::new(Duration::hours(1));
        assert!(store.latest().is_none());
        assert_eq!(store.prune(t0()), (0, 0));
    }
}
