//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap and infallible; a failed exporter install
//!   degrades to no-op recording rather than refusing to start
//! - Deployment-constant labels (database, kind, service group, version) are
//!   attached globally at exporter install, not on every call site

pub mod logging;
pub mod metrics;
