//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine loops, failover sink, admin API produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (compact or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (monitor id, ip, role) on every event
//! - Metric names share the `failover_` prefix; recording without an installed
//!   exporter is a no-op

pub mod logging;
pub mod metrics;
