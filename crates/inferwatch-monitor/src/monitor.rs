//! The monitoring cycle and the loop that drives it.

use std::time::Duration;

use http::Method;
use tokio::sync::watch;
use tracing::{debug, error, info};

use inferwatch_alert::{AlertGate, CandidateAlert, evaluate, overall_status};
use inferwatch_core::config::ThresholdsConfig;
use inferwatch_core::{MetricsSnapshot, MonitorConfig, Sample, Status};
use inferwatch_metrics::{Aggregator, HistoryStore};
use inferwatch_probe::{HealthCheck, InferenceCheck, Prober};

use crate::clock::{Clock, SystemClock};
use crate::reporter::{AlertRecord, MetricRecord, Reporter};
use crate::schedule::CycleSchedule;

/// How long samples and snapshots stay in history.
pub const HISTORY_RETENTION_HOURS: i64 = 1;

/// Pause between consecutive probes of one cycle.
pub const DEFAULT_SAMPLE_SPACING: Duration = Duration::from_millis(500);

/// Everything one cycle observed and decided.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub snapshot: MetricsSnapshot,
    pub overall: Status,
    /// Alerts that passed the gate and were reported.
    pub fired: Vec<CandidateAlert>,
    /// Alerts held back by cooldown, the notify list or disabled alerting.
    pub suppressed: Vec<CandidateAlert>,
    /// Alerts that passed the gate but the reporter rejected. Their cooldown
    /// is not started, so they are retried next cycle.
    pub undelivered: Vec<CandidateAlert>,
    /// Set when the inference check ran this cycle.
    pub inference: Option<InferenceCheck>,
}

struct SampleBatch {
    health: HealthCheck,
    samples: Vec<Sample>,
    interrupted: bool,
}

/// Runs monitoring cycles against one service.
///
/// All state carried between cycles (failure counter, cooldowns, history)
/// lives here, so a fresh `Monitor` starts from a clean slate.
pub struct Monitor<P, R, C = SystemClock> {
    prober: P,
    reporter: R,
    clock: C,
    schedule: CycleSchedule,
    thresholds: ThresholdsConfig,
    service_url: String,
    health_endpoint: String,
    samples_per_check: u32,
    sample_spacing: Duration,
    aggregator: Aggregator,
    gate: AlertGate,
    history: HistoryStore,
    cycles: u64,
}

impl<P: Prober, R: Reporter, C: Clock> Monitor<P, R, C> {
    pub fn new(config: &MonitorConfig, prober: P, reporter: R, clock: C) -> Self {
        Self {
            prober,
            reporter,
            clock,
            schedule: CycleSchedule::from_config(config),
            thresholds: config.thresholds.clone(),
            service_url: config.service.base_url.clone(),
            health_endpoint: config.service.endpoints.health.clone(),
            samples_per_check: config.monitoring.samples_per_check,
            sample_spacing: DEFAULT_SAMPLE_SPACING,
            aggregator: Aggregator::new(),
            gate: AlertGate::new(&config.alerts),
            history: HistoryStore::new(chrono::Duration::hours(HISTORY_RETENTION_HOURS)),
            cycles: 0,
        }
    }

    pub fn with_sample_spacing(mut self, spacing: Duration) -> Self {
        self.sample_spacing = spacing;
        self
    }

    /// Number of cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn schedule(&self) -> &CycleSchedule {
        &self.schedule
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.aggregator.consecutive_failures()
    }

    /// Run one full cycle: probe, aggregate, alert, report, prune.
    ///
    /// Reporter failures are logged per record and never cut the cycle short.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        let batch = self.collect_samples(None).await;
        self.finish_cycle(batch.health, batch.samples).await
    }

    /// Run cycles until `shutdown` flips to true or its sender is dropped.
    ///
    /// The signal is also observed between the samples of a cycle; an
    /// interrupted cycle is discarded without reporting anything.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            service = %self.service_url,
            interval_secs = self.schedule.check_interval().as_secs(),
            samples_per_check = self.samples_per_check,
            "monitoring started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.cycles += 1;
            let batch = self.collect_samples(Some(&mut shutdown)).await;
            if batch.interrupted {
                debug!(cycle = self.cycles, "cycle interrupted by shutdown");
                break;
            }
            self.finish_cycle(batch.health, batch.samples).await;

            let next = self.schedule.next_cycle_at(self.clock.now());
            debug!(next_cycle_at = %next, "waiting for next cycle");

            tokio::select! {
                _ = tokio::time::sleep(self.schedule.check_interval()) => {}
                _ = shutdown.changed() => {
                    debug!("shutdown signal received");
                    break;
                }
            }
        }

        self.log_final_status();
    }

    /// Take `samples_per_check` samples, the first being the health check.
    ///
    /// Samples are stamped with the monitor clock. Collection stops early if
    /// `shutdown` fires during the spacing pause.
    async fn collect_samples(
        &mut self,
        mut shutdown: Option<&mut watch::Receiver<bool>>,
    ) -> SampleBatch {
        debug!(cycle = self.cycles, service = %self.service_url, "cycle starting");

        let mut health = self.prober.probe_health().await;
        health.observed_at = self.clock.now();
        let mut samples = Vec::with_capacity(self.samples_per_check as usize);
        samples.push(health.to_sample(&self.health_endpoint));

        let mut interrupted = false;
        for _ in 1..self.samples_per_check {
            if !self.sample_spacing.is_zero() {
                let pause = tokio::time::sleep(self.sample_spacing);
                match shutdown.as_deref_mut() {
                    Some(rx) => tokio::select! {
                        _ = pause => {}
                        _ = rx.changed() => {
                            interrupted = true;
                            break;
                        }
                    },
                    None => pause.await,
                }
            }
            let mut sample = self
                .prober
                .probe_endpoint(&self.health_endpoint, Method::GET, None)
                .await;
            sample.observed_at = self.clock.now();
            samples.push(sample);
        }

        SampleBatch {
            health,
            samples,
            interrupted,
        }
    }

    async fn finish_cycle(&mut self, health: HealthCheck, samples: Vec<Sample>) -> CycleReport {
        let cycle = self.cycles;
        let now = self.clock.now();
        let snapshot = self.aggregator.aggregate(&samples, health.healthy, now);
        self.history.record_samples(&samples);
        self.history.record_snapshot(snapshot.clone());

        let overall = overall_status(&snapshot, &self.thresholds);
        let mut fired = Vec::new();
        let mut suppressed = Vec::new();
        let mut undelivered = Vec::new();
        for candidate in evaluate(&snapshot, &self.thresholds) {
            if !self.gate.should_fire(candidate.dimension, candidate.severity, now) {
                suppressed.push(candidate);
                continue;
            }
            match self.reporter.alert(AlertRecord::from(&candidate)) {
                Ok(()) => fired.push(candidate),
                Err(e) => {
                    error!(
                        cycle,
                        dimension = %candidate.dimension,
                        severity = %candidate.severity,
                        error = %e,
                        "failed to deliver alert"
                    );
                    self.gate.clear(candidate.dimension, candidate.severity);
                    undelivered.push(candidate);
                }
            }
        }

        self.report_metrics(&snapshot, overall);
        info!(
            cycle,
            status = %overall,
            avg_latency_ms = snapshot.avg_latency_ms,
            p95_latency_ms = snapshot.p95_latency_ms,
            error_rate_pct = snapshot.error_rate_pct,
            consecutive_failures = snapshot.consecutive_failures,
            healthy = snapshot.service_healthy,
            "{} RT={:.2}ms P95={:.2}ms ER={:.2}% CF={}",
            overall.symbol(),
            snapshot.avg_latency_ms,
            snapshot.p95_latency_ms,
            snapshot.error_rate_pct,
            snapshot.consecutive_failures
        );

        let inference = if self.schedule.inference_due(now) {
            Some(self.run_inference_check().await)
        } else {
            None
        };

        self.history.prune(now);

        CycleReport {
            snapshot,
            overall,
            fired,
            suppressed,
            undelivered,
            inference,
        }
    }

    async fn run_inference_check(&mut self) -> InferenceCheck {
        info!("running inference check");
        let check = self.prober.probe_inference().await;
        let record = if check.ok {
            MetricRecord::new("inference_time", check.latency_ms, Status::Normal)
        } else {
            MetricRecord::new("inference_failure", 1.0, Status::Critical)
        };
        self.emit(record);
        check
    }

    fn report_metrics(&mut self, snapshot: &MetricsSnapshot, overall: Status) {
        let metrics = [
            ("response_time_avg", snapshot.avg_latency_ms),
            ("response_time_p95", snapshot.p95_latency_ms),
            ("error_rate", snapshot.error_rate_pct),
            ("consecutive_failures", snapshot.consecutive_failures as f64),
        ];
        for (name, value) in metrics {
            self.emit(MetricRecord::new(name, value, overall));
        }

        let (value, status) = if snapshot.service_healthy {
            (1.0, Status::Normal)
        } else {
            (0.0, Status::Critical)
        };
        self.emit(MetricRecord::new("health_status", value, status));
    }

    /// Hand one metric to the reporter, logging a rejection.
    fn emit(&mut self, record: MetricRecord) {
        let name = record.name.clone();
        if let Err(e) = self.reporter.metric(record) {
            error!(cycle = self.cycles, metric = %name, error = %e, "failed to report metric");
        }
    }

    fn log_final_status(&self) {
        let retained = self.history.snapshot_count();
        match self.history.latest() {
            Some(last) => info!(
                cycles = self.cycles,
                retained_snapshots = retained,
                avg_latency_ms = last.avg_latency_ms,
                p95_latency_ms = last.p95_latency_ms,
                error_rate_pct = last.error_rate_pct,
                consecutive_failures = last.consecutive_failures,
                healthy = last.service_healthy,
                "monitoring stopped"
            ),
            None => info!(cycles = self.cycles, "monitoring stopped before any cycle completed"),
        }
    }
}
