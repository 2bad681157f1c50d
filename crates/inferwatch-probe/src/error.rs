//! Transport-level failures observed by a probe.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Why a probe did not produce an HTTP response.
///
/// Probes convert every variant into a failed result; the enum exists so
/// the failure reason can be logged with structure.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("connection failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("http handshake failed: {0}")]
    Handshake(#[source] hyper::Error),

    #[error("request failed: {0}")]
    Request(#[source] hyper::Error),

    #[error("failed to read response body: {0}")]
    Body(#[source] hyper::Error),

    #[error("failed to build request: {0}")]
    Build(#[from] http::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to read test asset {}: {source}", path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
