//! inferwatch-monitor: the cycle orchestrator.
//!
//! # Architecture
//!
//! ```text
//! Monitor::run(shutdown)
//!   loop
//!     run_cycle()
//!       ├── Prober: 1 health probe + (samples_per_check - 1) endpoint probes,
//!       │   spaced apart, stopping early on shutdown
//!       ├── Aggregator → MetricsSnapshot → HistoryStore
//!       ├── evaluate() → AlertGate → Reporter::alert
//!       ├── Reporter::metric × 5 + summary log
//!       ├── inference check when CycleSchedule::inference_due(now)
//!       └── HistoryStore::prune(now)
//!     sleep(check_interval) | shutdown.changed()
//!   final status log
//! ```

pub mod clock;
pub mod monitor;
pub mod reporter;
pub mod schedule;

pub use clock::{Clock, ManualClock, SystemClock};
pub use monitor::{CycleReport, DEFAULT_SAMPLE_SPACING, HISTORY_RETENTION_HOURS, Monitor};
pub use reporter::{AlertRecord, MetricRecord, Reporter};
pub use schedule::CycleSchedule;
