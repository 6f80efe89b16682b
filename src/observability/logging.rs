//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config, overridable via `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Compact format by default, JSON when `RUST_LOG_FORMAT=json`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber. `level` is used when `RUST_LOG` is unset.
pub fn init_logging(level: &str) {
    let filter = build_filter(std::env::var("RUST_LOG").ok().as_deref(), level);

    let json = std::env::var("RUST_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let layer = if json {
        tracing_subscriber::fmt::layer().json().with_filter(filter).boxed()
    } else {
        tracing_subscriber::fmt::layer().compact().with_filter(filter).boxed()
    };

    if tracing_subscriber::registry().with(layer).try_init().is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

fn build_filter(env: Option<&str>, level: &str) -> EnvFilter {
    if let Some(directives) = env.filter(|d| !d.trim().is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }
    EnvFilter::try_new(format!("dns_failover={level},tower_http={level}"))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
