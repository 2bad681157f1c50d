//! inferwatch-alert: threshold evaluation and alert suppression.
//!
//! [`evaluate`] maps a snapshot to at most one candidate alert per
//! dimension (critical wins over warning). [`AlertGate`] then decides which
//! candidates actually fire, suppressing repeats of the same
//! dimension/severity pair within the cooldown window.
//!
//! # Comparison rules
//!
//! ```text
//! response_time, p95_latency, error_rate   value >  threshold
//! consecutive_failures                     value >= threshold
//! health_status                            critical whenever unhealthy
//! ```

pub mod evaluator;
pub mod gate;

pub use evaluator::{CandidateAlert, Severity, evaluate, overall_status};
pub use gate::AlertGate;
