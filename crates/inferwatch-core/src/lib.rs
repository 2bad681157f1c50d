//! inferwatch-core: shared types and configuration for inferwatch.
//!
//! Holds the records that flow through a monitoring cycle ([`Sample`],
//! [`MetricsSnapshot`]) and the typed `monitoring.toml` configuration
//! consumed by every other crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::MonitorConfig;
pub use error::{ConfigError, ConfigResult};
pub use types::*;
