//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Probes (probe.rs):
//!     ProbeSpec (ping | http | tcp)
//!     → one network round trip
//!     → bool
//!
//! State machine (state.rs):
//!     Normal ←→ Down
//!     With thresholds to prevent flapping
//! ```
//!
//! # Design Decisions
//! - Probes are stateless; all counters live in `MonitorState`
//! - State transitions require consecutive successes/failures
//! - The backup endpoint is tracked only while a failover is active

pub mod probe;
pub mod state;

pub use probe::{NetworkProber, ProbeSpec, Prober};
pub use state::{EndpointRole, MonitorState, MonitorStatus, SwitchPolicy, Transition};
