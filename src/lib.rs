//! DNS failover monitoring service.
//!
//! Watches primary endpoints, fails DNS records over to a backup when the
//! primary stops answering, restores them when it recovers, and supports
//! timer-driven switching.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ config ──▶ store (monitors, event logs)
//!                                │
//!                                ▼
//!   admin API ◀──────────────▶ engine ──▶ health::Prober (ping / http / tcp)
//!   (axum)                       │
//!                                ▼ MonitorEvent
//!                            failover::FailoverSink
//!                         ┌──────┼─────────┐
//!                         ▼      ▼         ▼
//!                        dns   alerts    store
//! ```
//!
//! The admin API also edits zones and records through `dns`, and keeps
//! Cloudflare accounts, runtime settings and the login token in `store`.

// Core
pub mod config;
pub mod engine;
pub mod health;

// Collaborators
pub mod alerts;
pub mod dns;
pub mod failover;
pub mod store;

// Surfaces and cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use engine::Engine;
pub use lifecycle::Shutdown;
