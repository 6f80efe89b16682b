//! Process lifecycle: startup ordering, signals and the root shutdown watch.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Open store → Import seeds → Start stored monitors
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop admin API → Cancel monitor loops → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then store, then engine, then the API
//! - One root shutdown watch observed by every loop

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
