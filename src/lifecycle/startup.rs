//! Startup orchestration.
//!
//! # Responsibilities
//! - Import seed monitors into an empty store
//! - Activate every stored monitor
//! - Pick the integration settings to start with
//! - Replace the admin login token offline
//!
//! # Design Decisions
//! - A bad stored monitor is logged and skipped; the others still start
//! - Seeds are imported only once, the store owns monitors afterwards
//! - Settings saved through the admin API win over the config file

use std::io::BufRead;

use thiserror::Error;

use crate::config::{AppConfig, IntegrationsConfig, MonitorConfig};
use crate::engine::Engine;
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum TokenResetError {
    #[error("token must not be empty")]
    Empty,

    #[error("failed to read token: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Copy `seeds` into the store when it holds no monitors. Returns the number imported.
pub fn seed_monitors(store: &Store, seeds: &[MonitorConfig]) -> usize {
    if seeds.is_empty() || !store.list_monitors().is_empty() {
        return 0;
    }

    tracing::info!(count = seeds.len(), "Importing seed monitors from config");
    let mut imported = 0;
    for seed in seeds {
        match store.upsert_monitor(seed.clone()) {
            Ok(()) => imported += 1,
            Err(e) => tracing::error!(monitor_id = %seed.id, error = %e, "Failed to import seed monitor"),
        }
    }
    imported
}

/// Start every stored monitor. Returns (started, skipped).
pub async fn start_stored_monitors(engine: &Engine, store: &Store) -> (usize, usize) {
    let mut started = 0;
    let mut skipped = 0;

    for monitor in store.list_monitors() {
        match engine.start_monitor(&monitor).await {
            Ok(()) => started += 1,
            Err(e) => {
                skipped += 1;
                tracing::error!(monitor_id = %monitor.id, error = %e, "Skipping invalid monitor");
            }
        }
    }

    tracing::info!(started, skipped, "Stored monitors activated");
    (started, skipped)
}

/// Integration settings in effect at startup.
pub fn initial_integrations(config: &AppConfig, store: &Store) -> IntegrationsConfig {
    match store.integrations() {
        Some(saved) => {
            tracing::info!("Using integration settings saved through the admin API");
            saved
        }
        None => config.integrations(),
    }
}

/// Read one line from `input` and store it as the admin login token.
pub fn reset_token(store: &Store, mut input: impl BufRead) -> Result<(), TokenResetError> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let token = line.trim();
    if token.is_empty() {
        return Err(TokenResetError::Empty);
    }
    store.set_auth_token(token)?;
    Ok(())
}
