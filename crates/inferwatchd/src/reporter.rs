//! JSON-lines metric sink.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, error, warn};

use inferwatch_alert::Severity;
use inferwatch_core::Status;
use inferwatch_monitor::{AlertRecord, MetricRecord, Reporter};

/// One line of the metrics file.
#[derive(Serialize)]
struct MetricLine<'a> {
    timestamp: String,
    metric: &'a str,
    value: f64,
    status: Status,
    tags: &'a BTreeMap<String, String>,
}

/// Appends every metric as one JSON object per line.
///
/// Alerts are logged at `warn` or `error` and also written as an
/// `alert_{type}` metric.
pub struct JsonlReporter {
    path: PathBuf,
    file: File,
}

impl JsonlReporter {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open metrics file {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, record: &MetricRecord) -> anyhow::Result<()> {
        let line = MetricLine {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            metric: &record.name,
            value: record.value,
            status: record.status,
            tags: &record.tags,
        };
        let mut json = serde_json::to_string(&line)?;
        json.push('\n');
        self.file
            .write_all(json.as_bytes())
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl Reporter for JsonlReporter {
    fn metric(&mut self, record: MetricRecord) -> anyhow::Result<()> {
        debug!(metric = %record.name, value = record.value, status = %record.status, "metric");
        self.write_line(&record)
    }

    fn alert(&mut self, record: AlertRecord) -> anyhow::Result<()> {
        match record.level {
            Severity::Critical => error!(
                alert_type = %record.alert_type,
                value = record.value,
                threshold = record.threshold,
                "🚨 {}",
                record.message
            ),
            Severity::Warning => warn!(
                alert_type = %record.alert_type,
                value = record.value,
                threshold = record.threshold,
                "⚠️ {}",
                record.message
            ),
        }

        let metric = MetricRecord::new(
            format!("alert_{}", record.alert_type),
            1.0,
            Status::from(record.level),
        )
        .with_tag("type", record.alert_type.as_str())
        .with_tag("message", record.message);
        self.write_line(&metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use inferwatch_core::Dimension;

    fn lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn metric_is_one_json_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("metrics.jsonl");
        let mut reporter = JsonlReporter::open(&path).unwrap();

        reporter
            .metric(MetricRecord::new("error_rate", 12.5, Status::Warning))
            .unwrap();
        reporter
            .metric(MetricRecord::new("health_status", 1.0, Status::Normal))
            .unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["metric"], "error_rate");
        assert_eq!(lines[0]["value"], 12.5);
        assert_eq!(lines[0]["status"], "warning");
        assert_eq!(lines[0]["tags"], serde_json::json!({}));

        let ts = lines[1]["timestamp"].as_str().unwrap();
        assert!(ts.ends_with('Z'));
        DateTime::parse_from_rfc3339(ts).unwrap();
    }

    #[test]
    fn alert_written_as_tagged_metric() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");
        let mut reporter = JsonlReporter::open(&path).unwrap();

        reporter
            .alert(AlertRecord {
                alert_type: Dimension::P95Latency,
                message: "critical p95 latency: 9000.00ms".to_string(),
                level: Severity::Critical,
                value: 9000.0,
                threshold: 6000.0,
            })
            .unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["metric"], "alert_p95_latency");
        assert_eq!(lines[0]["value"], 1.0);
        assert_eq!(lines[0]["status"], "critical");
        assert_eq!(lines[0]["tags"]["type"], "p95_latency");
        assert_eq!(
            lines[0]["tags"]["message"],
            "critical p95 latency: 9000.00ms"
        );
    }

    #[test]
    fn reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");

        JsonlReporter::open(&path)
            .unwrap()
            .metric(MetricRecord::new("response_time_avg", 10.0, Status::Normal))
            .unwrap();
        JsonlReporter::open(&path)
            .unwrap()
            .metric(MetricRecord::new("response_time_avg", 20.0, Status::Normal))
            .unwrap();

        let values: Vec<f64> = lines(&path)
            .iter()
            .map(|l| l["value"].as_f64().unwrap())
            .collect();
        assert_eq!(values, vec![10.0, 20.0]);
    }
}
