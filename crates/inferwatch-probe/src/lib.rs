//! inferwatch-probe: outbound probes against the monitored service.
//!
//! Every probe opens its own HTTP/1 connection, measures the elapsed time
//! end to end (connection setup included) and turns the outcome into a
//! uniform record. Transport failures never escape this crate: they are
//! folded into failed [`Sample`]s, [`HealthCheck`]s or [`InferenceCheck`]s.
//!
//! # Architecture
//!
//! ```text
//! Prober (trait)
//!   └── HttpProber
//!         ├── probe_health()    GET  {base}{health}   timeout T
//!         ├── probe_endpoint()  ANY  {base}{path}     timeout T
//!         └── probe_inference() POST {base}{predict}  timeout 2T, multipart
//!               └── transport::send() → Result<HttpResponse, ProbeError>
//! ```
//!
//! [`Sample`]: inferwatch_core::Sample

pub mod error;
pub mod multipart;
pub mod prober;
mod transport;

pub use error::ProbeError;
pub use prober::{HealthCheck, HttpProber, InferenceCheck, Prober};
pub use transport::Target;
