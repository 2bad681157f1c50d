//! monitoring.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Dimension, ThresholdPair};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub service: ServiceConfig,
    pub monitoring: MonitoringConfig,
    pub thresholds: ThresholdsConfig,
    pub alerts: AlertsConfig,
    pub logging: LoggingConfig,
    pub inference_test: InferenceTestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub endpoints: EndpointsConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            endpoints: EndpointsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub health: String,
    pub predict: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            health: "/health".to_string(),
            predict: "/predict".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub check_interval_seconds: u64,
    pub samples_per_check: u32,
    pub request_timeout_seconds: u64,
    pub inference_test_interval_minutes: u32,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: 30,
            samples_per_check: 3,
            request_timeout_seconds: 10,
            inference_test_interval_minutes: 5,
        }
    }
}

impl MonitoringConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub response_time_ms: ThresholdPair<f64>,
    pub p95_latency_ms: ThresholdPair<f64>,
    pub error_rate_percent: ThresholdPair<f64>,
    pub consecutive_failures: ThresholdPair<u64>,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            response_time_ms: ThresholdPair::new(2000.0, 5000.0),
            p95_latency_ms: ThresholdPair::new(3000.0, 6000.0),
            error_rate_percent: ThresholdPair::new(10.0, 25.0),
            consecutive_failures: ThresholdPair::new(3, 5),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub enabled: bool,
    pub cooldown_minutes: u64,
    /// Dimensions allowed to raise alerts.
    pub notify_on: Vec<Dimension>,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_minutes: 5,
            notify_on: Dimension::ALL.to_vec(),
        }
    }
}

impl AlertsConfig {
    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cooldown_minutes as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub console_colors: bool,
    pub log_level: String,
    pub log_file: PathBuf,
    pub metrics_file: PathBuf,
    pub max_log_size_mb: u64,
    pub backup_count: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_colors: true,
            log_level: "info".to_string(),
            log_file: PathBuf::from("logs/monitoring.log"),
            metrics_file: PathBuf::from("logs/metrics.jsonl"),
            max_log_size_mb: 10,
            backup_count: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceTestConfig {
    pub enabled: bool,
    pub test_image_path: PathBuf,
    pub expected_fields: Vec<String>,
}

impl Default for InferenceTestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            test_image_path: PathBuf::from("test_images/sample.jpg"),
            expected_fields: vec![
                "filename".to_string(),
                "result".to_string(),
                "status_code".to_string(),
            ],
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl MonitorConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: MonitorConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Write this config to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = self.to_toml_string()?;
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)
        };
        write().map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let service = &self.service;
        if !service.base_url.starts_with("http://") {
            return Err(ConfigError::Invalid(format!(
                "service.base_url must be an http:// URL, got {:?}",
                service.base_url
            )));
        }
        for (name, path) in [
            ("health", &service.endpoints.health),
            ("predict", &service.endpoints.predict),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "service.endpoints.{name} must start with '/', got {path:?}"
                )));
            }
        }

        let monitoring = &self.monitoring;
        if monitoring.check_interval_seconds == 0 {
            return Err(invalid_zero("monitoring.check_interval_seconds"));
        }
        if monitoring.samples_per_check == 0 {
            return Err(invalid_zero("monitoring.samples_per_check"));
        }
        if monitoring.request_timeout_seconds == 0 {
            return Err(invalid_zero("monitoring.request_timeout_seconds"));
        }
        if monitoring.inference_test_interval_minutes == 0 {
            return Err(invalid_zero("monitoring.inference_test_interval_minutes"));
        }

        let t = &self.thresholds;
        let ordered = [
            ("response_time_ms", t.response_time_ms.is_ordered()),
            ("p95_latency_ms", t.p95_latency_ms.is_ordered()),
            ("error_rate_percent", t.error_rate_percent.is_ordered()),
            ("consecutive_failures", t.consecutive_failures.is_ordered()),
        ];
        if let Some((name, _)) = ordered.iter().find(|(_, ok)| !ok) {
            return Err(ConfigError::Invalid(format!(
                "thresholds.{name}: warning must not exceed critical"
            )));
        }

        let level = self.logging.log_level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.log_level must be one of {LOG_LEVELS:?}, got {:?}",
                self.logging.log_level
            )));
        }

        Ok(())
    }
}

fn invalid_zero(field: &str) -> ConfigError {
    ConfigError::Invalid(format!("{field} must be greater than zero"))
}
