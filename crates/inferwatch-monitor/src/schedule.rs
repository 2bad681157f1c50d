//! Cycle timing: the fixed check interval and the minute-aligned
//! inference trigger.

use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};

use inferwatch_core::MonitorConfig;

#[derive(Debug, Clone)]
pub struct CycleSchedule {
    check_interval: Duration,
    inference_enabled: bool,
    inference_every_minutes: u32,
}

impl CycleSchedule {
    pub fn new(
        check_interval: Duration,
        inference_enabled: bool,
        inference_every_minutes: u32,
    ) -> Self {
        Self {
            check_interval,
            inference_enabled,
            inference_every_minutes,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            config.monitoring.check_interval(),
            config.inference_test.enabled,
            config.monitoring.inference_test_interval_minutes,
        )
    }

    /// Sleep between the end of one cycle and the start of the next.
    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Earliest start of the cycle following one that finished at `last`.
    pub fn next_cycle_at(&self, last: DateTime<Utc>) -> DateTime<Utc> {
        last + chrono::Duration::milliseconds(self.check_interval.as_millis() as i64)
    }

    /// True when the inference check runs this cycle.
    ///
    /// Evaluated once per cycle against the UTC minute: with a check
    /// interval over a minute some aligned minutes are skipped, with a
    /// shorter one the check can run more than once in the same minute.
    pub fn inference_due(&self, now: DateTime<Utc>) -> bool {
        self.inference_enabled
            && self.inference_every_minutes > 0
            && now.minute() % self.inference_every_minutes == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, second).unwrap()
    }

    #[test]
    fn inference_due_on_aligned_minutes() {
        let schedule = CycleSchedule::new(Duration::from_secs(30), true, 5);
        assert!(schedule.inference_due(at(0, 0)));
        assert!(schedule.inference_due(at(15, 42)));
        assert!(!schedule.inference_due(at(16, 0)));
        assert!(!schedule.inference_due(at(59, 59)));
    }

    #[test]
    fn inference_never_due_when_disabled() {
        let schedule = CycleSchedule::new(Duration::from_secs(30), false, 5);
        assert!(!schedule.inference_due(at(0, 0)));
    }

    #[test]
    fn every_minute_interval() {
        let schedule = CycleSchedule::new(Duration::from_secs(30), true, 1);
        assert!((0..60).all(|m| schedule.inference_due(at(m, 0))));
    }

    #[test]
    fn next_cycle_is_one_interval_later() {
        let schedule = CycleSchedule::new(Duration::from_secs(30), true, 5);
        assert_eq!(schedule.next_cycle_at(at(10, 0)), at(10, 30));
    }

    #[test]
    fn from_config_uses_monitoring_section() {
        let mut config = MonitorConfig::default();
        config.monitoring.check_interval_seconds = 45;
        config.monitoring.inference_test_interval_minutes = 10;
        let schedule = CycleSchedule::from_config(&config);
        assert_eq!(schedule.check_interval(), Duration::from_secs(45));
        assert!(schedule.inference_due(at(20, 0)));
        assert!(!schedule.inference_due(at(25, 0)));
    }
}
