//! Per-(dimension, severity) cooldown gate.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use inferwatch_core::Dimension;
use inferwatch_core::config::AlertsConfig;

use crate::evaluator::Severity;

/// Decides whether a candidate alert is delivered or suppressed.
///
/// A warning and a critical on the same dimension have separate cooldowns.
/// Suppressed alerts do not extend the cooldown.
#[derive(Debug)]
pub struct AlertGate {
    enabled: bool,
    cooldown: Duration,
    notify_on: HashSet<Dimension>,
    last_fired: HashMap<(Dimension, Severity), DateTime<Utc>>,
}

impl AlertGate {
    pub fn new(config: &AlertsConfig) -> Self {
        Self {
            enabled: config.enabled,
            cooldown: config.cooldown(),
            notify_on: config.notify_on.iter().copied().collect(),
            last_fired: HashMap::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Returns true if the alert should fire, recording `now` when it does.
    pub fn should_fire(
        &mut self,
        dimension: Dimension,
        severity: Severity,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        if !self.notify_on.contains(&dimension) {
            debug!(%dimension, %severity, "alert dimension not in notify list");
            return false;
        }

        let key = (dimension, severity);
        if let Some(last) = self.last_fired.get(&key) {
            let elapsed = now - *last;
            if elapsed < self.cooldown {
                debug!(
                    %dimension,
                    %severity,
                    elapsed_secs = elapsed.num_seconds(),
                    "alert suppressed by cooldown"
                );
                return false;
            }
        }

        self.last_fired.insert(key, now);
        true
    }

    /// Forget the last firing, e.g. after the alert failed to reach its sink.
    pub fn clear(&mut self, dimension: Dimension, severity: Severity) {
        self.last_fired.remove(&(dimension, severity));
    }

    /// When this (dimension, severity) last fired.
    pub fn last_fired(&self, dimension: Dimension, severity: Severity) -> Option<DateTime<Utc>> {
        self.last_fired.get(&(dimension, severity)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn gate() -> AlertGate {
        AlertGate::new(&AlertsConfig::default())
    }

    #[test]
    fn first_occurrence_fires() {
        let mut gate = gate();
        assert!(gate.should_fire(Dimension::P95Latency, Severity::Critical, t0()));
        assert_eq!(
            gate.last_fired(Dimension::P95Latency, Severity::Critical),
            Some(t0())
        );
    }

    #[test]
    fn repeat_within_cooldown_is_suppressed() {
        let mut gate = gate();
        assert!(gate.should_fire(Dimension::ErrorRate, Severity::Warning, t0()));
        let later = t0() + Duration::minutes(4) + Duration::seconds(59);
        assert!(!gate.should_fire(Dimension::ErrorRate, Severity::Warning, later));
        // suppression does not move the timestamp
        assert_eq!(
            gate.last_fired(Dimension::ErrorRate, Severity::Warning),
            Some(t0())
        );
    }

    #[test]
    fn fires_again_once_cooldown_elapsed() {
        let mut gate = gate();
        assert!(gate.should_fire(Dimension::ErrorRate, Severity::Warning, t0()));
        assert!(!gate.should_fire(
            Dimension::ErrorRate,
            Severity::Warning,
            t0() + Duration::minutes(3)
        ));
        let at_cooldown = t0() + Duration::minutes(5);
        assert!(gate.should_fire(Dimension::ErrorRate, Severity::Warning, at_cooldown));
        assert_eq!(
            gate.last_fired(Dimension::ErrorRate, Severity::Warning),
            Some(at_cooldown)
        );
    }

    #[test]
    fn severities_have_independent_cooldowns() {
        let mut gate = gate();
        assert!(gate.should_fire(Dimension::ResponseTime, Severity::Warning, t0()));
        assert!(gate.should_fire(
            Dimension::ResponseTime,
            Severity::Critical,
            t0() + Duration::minutes(1)
        ));
        assert!(gate.should_fire(
            Dimension::P95Latency,
            Severity::Warning,
            t0() + Duration::minutes(1)
        ));
    }

    #[test]
    fn cleared_entry_fires_again_within_cooldown() {
        let mut gate = gate();
        assert!(gate.should_fire(Dimension::HealthStatus, Severity::Critical, t0()));
        gate.clear(Dimension::HealthStatus, Severity::Critical);
        assert!(gate.last_fired(Dimension::HealthStatus, Severity::Critical).is_none());

        let later = t0() + Duration::seconds(30);
        assert!(gate.should_fire(Dimension::HealthStatus, Severity::Critical, later));
        // other keys are untouched
        assert!(gate.should_fire(Dimension::HealthStatus, Severity::Warning, later));
        assert!(!gate.should_fire(Dimension::HealthStatus, Severity::Warning, later));
    }

    #[test]
    fn disabled_gate_never_fires() {
        let config = AlertsConfig {
            enabled: false,
            ..AlertsConfig::default()
        };
        let mut gate = AlertGate::new(&config);
        assert!(!gate.should_fire(Dimension::HealthStatus, Severity::Critical, t0()));
        assert!(gate.last_fired(Dimension::HealthStatus, Severity::Critical).is_none());
    }

    #[test]
    fn dimensions_outside_notify_list_are_dropped() {
        let config = AlertsConfig {
            notify_on: vec![Dimension::HealthStatus],
            ..AlertsConfig::default()
        };
        let mut gate = AlertGate::new(&config);
        assert!(!gate.should_fire(Dimension::ErrorRate, Severity::Critical, t0()));
        assert!(gate.should_fire(Dimension::HealthStatus, Severity::Critical, t0()));
    }

    #[test]
    fn zero_cooldown_always_fires() {
        let config = AlertsConfig {
            cooldown_minutes: 0,
            ..AlertsConfig::default()
        };
        let mut gate = AlertGate::new(&config);
        assert!(gate.should_fire(Dimension::ErrorRate, Severity::Critical, t0()));
        assert!(gate.should_fire(Dimension::ErrorRate, Severity::Critical, t0()));
    }
}
