//! Output seam for metric and alert records.

use std::collections::BTreeMap;

use serde::Serialize;

use inferwatch_alert::{CandidateAlert, Severity};
use inferwatch_core::{Dimension, Status};

/// One structured metric emitted by a cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub name: String,
    pub value: f64,
    pub status: Status,
    pub tags: BTreeMap<String, String>,
}

impl MetricRecord {
    pub fn new(name: impl Into<String>, value: f64, status: Status) -> Self {
        Self {
            name: name.into(),
            value,
            status,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// An alert that passed the cooldown gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    #[serde(rename = "type")]
    pub alert_type: Dimension,
    pub message: String,
    pub level: Severity,
    pub value: f64,
    pub threshold: f64,
}

impl From<&CandidateAlert> for AlertRecord {
    fn from(alert: &CandidateAlert) -> Self {
        Self {
            alert_type: alert.dimension,
            message: alert.message.clone(),
            level: alert.severity,
            value: alert.observed_value,
            threshold: alert.threshold_value,
        }
    }
}

/// Destination for everything a cycle reports.
pub trait Reporter: Send {
    fn metric(&mut self, record: MetricRecord) -> anyhow::Result<()>;

    fn alert(&mut self, record: AlertRecord) -> anyhow::Result<()>;
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn metric(&mut self, record: MetricRecord) -> anyhow::Result<()> {
        (**self).metric(record)
    }

    fn alert(&mut self, record: AlertRecord) -> anyhow::Result<()> {
        (**self).alert(record)
    }
}
