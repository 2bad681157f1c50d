//! One-shot HTTP/1 exchange over a fresh TCP connection.

use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use tracing::debug;

use crate::error::ProbeError;

const USER_AGENT: &str = concat!("inferwatch/", env!("CARGO_PKG_VERSION"));

/// Where probes are sent: the `host:port` to dial plus an optional path
/// prefix taken from the configured base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    address: String,
    base_path: String,
}

impl Target {
    /// Parse an `http://host[:port][/prefix]` base URL.
    pub fn parse(base_url: &str) -> Result<Self, ProbeError> {
        let invalid = |reason: &str| ProbeError::InvalidUrl {
            url: base_url.to_string(),
            reason: reason.to_string(),
        };

        let uri: Uri = base_url.parse().map_err(|_| invalid("not a valid URI"))?;
        if uri.scheme_str() != Some("http") {
            return Err(invalid("only http:// is supported"));
        }
        let host = uri.host().ok_or_else(|| invalid("missing host"))?;
        let port = uri.port_u16().unwrap_or(80);

        Ok(Self {
            address: format!("{host}:{port}"),
            base_path: uri.path().trim_end_matches('/').to_string(),
        })
    }

    /// The `host:port` pair dialed for every probe.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Origin-form request path for an endpoint (e.g. `/api/health`).
    pub fn path_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_path, endpoint)
    }

    /// Build a request for `endpoint` with the headers every probe carries.
    pub(crate) fn request(
        &self,
        method: Method,
        endpoint: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<Request<Full<Bytes>>, ProbeError> {
        let mut builder = Request::builder()
            .method(method)
            .uri(self.path_for(endpoint))
            .header(http::header::HOST, &self.address)
            .header(http::header::USER_AGENT, USER_AGENT);
        if let Some(content_type) = content_type {
            builder = builder.header(http::header::CONTENT_TYPE, content_type);
        }
        Ok(builder.body(Full::new(body))?)
    }
}

/// Status and fully-read body of a completed exchange.
#[derive(Debug)]
pub(crate) struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Send one request to `address`, bounded by `timeout`.
///
/// The connection is opened for this request only and torn down when the
/// exchange finishes, fails or times out.
pub(crate) async fn send(
    address: &str,
    request: Request<Full<Bytes>>,
    timeout: Duration,
) -> Result<HttpResponse, ProbeError> {
    match tokio::time::timeout(timeout, exchange(address, request)).await {
        Ok(result) => result,
        Err(_) => {
            debug!(%address, ?timeout, "probe timed out");
            Err(ProbeError::Timeout(timeout))
        }
    }
}

async fn exchange(
    address: &str,
    request: Request<Full<Bytes>>,
) -> Result<HttpResponse, ProbeError> {
    let stream = tokio::net::TcpStream::connect(address)
        .await
        .map_err(ProbeError::Connect)?;

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(ProbeError::Handshake)?;

    // Drive the connection in the background for the lifetime of this exchange.
    let driver = tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "probe connection closed with error");
        }
    });

    let result = async {
        let response = sender
            .send_request(request)
            .await
            .map_err(ProbeError::Request)?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(ProbeError::Body)?
            .to_bytes();
        Ok(HttpResponse { status, body })
    }
    .await;

    driver.abort();
    result
}
