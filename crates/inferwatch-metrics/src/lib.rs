//! inferwatch-metrics: turns a cycle's samples into a metrics snapshot.
//!
//! # Architecture
//!
//! ```text
//! Aggregator
//!   ├── consecutive_failures   (carried across cycles)
//!   └── aggregate() → MetricsSnapshot
//!         ├── avg / p95 over successful latencies
//!         └── error rate over the whole batch
//!
//! HistoryStore
//!   ├── record_samples() / record_snapshot()
//!   └── prune(now)  drops entries older than the retention window
//! ```

pub mod aggregator;
pub mod history;

pub use aggregator::{Aggregator, aggregate, percentile};
pub use history::HistoryStore;
