//! Health, endpoint and inference probes.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{Method, StatusCode};
use tracing::{debug, error, info, warn};

use inferwatch_core::{MonitorConfig, Sample};

use crate::error::ProbeError;
use crate::multipart::{self, FilePart};
use crate::transport::{self, HttpResponse, Target};

/// Maximum number of characters of an error body kept for logging.
const MAX_BODY_LOG_CHARS: usize = 200;

/// Result of a health probe.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthCheck {
    /// True only for an HTTP 200 response.
    pub healthy: bool,
    pub latency_ms: f64,
    /// Response status, or 0 when no response was received.
    pub status_code: u16,
    pub observed_at: DateTime<Utc>,
}

impl HealthCheck {
    /// Record this check as one sample of the cycle batch.
    pub fn to_sample(&self, endpoint: &str) -> Sample {
        Sample {
            endpoint: endpoint.to_string(),
            latency_ms: self.latency_ms,
            status_code: self.status_code,
            success: self.healthy,
            observed_at: self.observed_at,
        }
    }
}

/// Result of an inference probe.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceCheck {
    /// HTTP 200 with every required field present.
    pub ok: bool,
    pub latency_ms: f64,
    pub status_code: u16,
    /// Parsed response body, kept for diagnostics even when `ok` is false.
    pub payload: Option<serde_json::Value>,
    /// Required fields absent from the payload.
    pub missing_fields: Vec<String>,
}

impl InferenceCheck {
    fn failed(latency_ms: f64, status_code: u16) -> Self {
        Self {
            ok: false,
            latency_ms,
            status_code,
            payload: None,
            missing_fields: Vec::new(),
        }
    }
}

/// Outbound probes used by the monitoring cycle.
///
/// Implementations must never fail: every transport problem is reported
/// as an unsuccessful result.
pub trait Prober {
    /// `GET` the health endpoint.
    fn probe_health(&self) -> impl Future<Output = HealthCheck> + Send;

    /// Upload the test asset to the predict endpoint and validate the reply.
    fn probe_inference(&self) -> impl Future<Output = InferenceCheck> + Send;

    /// Send one request to `endpoint`; success means a status below 400.
    fn probe_endpoint(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Bytes>,
    ) -> impl Future<Output = Sample> + Send;
}

/// [`Prober`] speaking plain HTTP/1.1 to the monitored service.
#[derive(Debug, Clone)]
pub struct HttpProber {
    target: Target,
    health_endpoint: String,
    predict_endpoint: String,
    timeout: Duration,
    test_asset: PathBuf,
    required_fields: Vec<String>,
}

impl HttpProber {
    /// Build a prober from the service, monitoring and inference settings.
    pub fn new(config: &MonitorConfig) -> Result<Self, ProbeError> {
        Ok(Self {
            target: Target::parse(&config.service.base_url)?,
            health_endpoint: config.service.endpoints.health.clone(),
            predict_endpoint: config.service.endpoints.predict.clone(),
            timeout: config.monitoring.request_timeout(),
            test_asset: config.inference_test.test_image_path.clone(),
            required_fields: config.inference_test.expected_fields.clone(),
        })
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        content_type: Option<&str>,
        body: Bytes,
        timeout: Duration,
    ) -> Result<HttpResponse, ProbeError> {
        let request = self.target.request(method, endpoint, content_type, body)?;
        transport::send(self.target.address(), request, timeout).await
    }
}

impl Prober for HttpProber {
    async fn probe_health(&self) -> HealthCheck {
        let start = Instant::now();
        let result = self
            .send(Method::GET, &self.health_endpoint, None, Bytes::new(), self.timeout)
            .await;
        let latency_ms = elapsed_ms(start);
        let observed_at = Utc::now();

        match result {
            Ok(response) if response.status == StatusCode::OK => HealthCheck {
                healthy: true,
                latency_ms,
                status_code: response.status.as_u16(),
                observed_at,
            },
            Ok(response) => {
                warn!(
                    status_code = response.status.as_u16(),
                    latency_ms, "health check failed"
                );
                HealthCheck {
                    healthy: false,
                    latency_ms,
                    status_code: response.status.as_u16(),
                    observed_at,
                }
            }
            Err(e) => {
                error!(error = %e, latency_ms, "health check error");
                HealthCheck {
                    healthy: false,
                    latency_ms,
                    status_code: 0,
                    observed_at,
                }
            }
        }
    }

    async fn probe_inference(&self) -> InferenceCheck {
        let data = match tokio::fs::read(&self.test_asset).await {
            Ok(data) => data,
            Err(source) => {
                let e = ProbeError::Asset {
                    path: self.test_asset.clone(),
                    source,
                };
                error!(error = %e, "inference test asset unavailable");
                return InferenceCheck::failed(0.0, 0);
            }
        };

        let boundary = multipart::boundary();
        let body = multipart::encode(
            &boundary,
            FilePart {
                field: "file",
                filename: &file_name(&self.test_asset),
                content_type: multipart::mime_for(&self.test_asset),
                data: &data,
            },
        );

        let start = Instant::now();
        let result = self
            .send(
                Method::POST,
                &self.predict_endpoint,
                Some(&multipart::content_type(&boundary)),
                body,
                self.timeout * 2,
            )
            .await;
        let latency_ms = elapsed_ms(start);

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, latency_ms, "inference test error");
                return InferenceCheck::failed(latency_ms, 0);
            }
        };
        let status_code = response.status.as_u16();

        if response.status != StatusCode::OK {
            error!(
                status_code,
                body = %truncate_body(&response.body, MAX_BODY_LOG_CHARS),
                "inference test failed"
            );
            return InferenceCheck::failed(latency_ms, status_code);
        }

        let payload: serde_json::Value = match serde_json::from_slice(&response.body) {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, status_code, "inference response is not valid JSON");
                return InferenceCheck::failed(latency_ms, status_code);
            }
        };

        let missing_fields = missing_fields(&payload, &self.required_fields);
        let ok = missing_fields.is_empty();
        if ok {
            info!(latency_ms, "inference test passed");
        } else {
            warn!(
                missing = ?missing_fields,
                response = %payload,
                "inference response missing fields"
            );
        }

        InferenceCheck {
            ok,
            latency_ms,
            status_code,
            payload: Some(payload),
            missing_fields,
        }
    }

    async fn probe_endpoint(&self, endpoint: &str, method: Method, body: Option<Bytes>) -> Sample {
        let start = Instant::now();
        let result = self
            .send(method, endpoint, None, body.unwrap_or_default(), self.timeout)
            .await;
        let latency_ms = elapsed_ms(start);
        let observed_at = Utc::now();

        match result {
            Ok(response) => {
                let status_code = response.status.as_u16();
                debug!(endpoint, status_code, latency_ms, "endpoint probed");
                Sample {
                    endpoint: endpoint.to_string(),
                    latency_ms,
                    status_code,
                    success: status_code < 400,
                    observed_at,
                }
            }
            Err(e) => {
                error!(endpoint, error = %e, "request failed");
                Sample::transport_failure(endpoint, latency_ms, observed_at)
            }
        }
    }
}

/// Required fields not present at the top level of `payload`.
pub fn missing_fields(payload: &serde_json::Value, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|field| payload.get(field.as_str()).is_none())
        .cloned()
        .collect()
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string())
}

/// Truncate to at most `max` bytes on a char boundary.
fn truncate_body(bytes: &[u8], max: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= max {
        return text.into_owned();
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
