//! HTTP admin API.
//!
//! # Routes
//! ```text
//! GET    /healthz                     liveness, no auth
//! POST   /api/auth/login              set the token on first use, else verify it; no auth
//! GET    /api/auth/status             whether a token exists; no auth
//! GET    /api/status                  monitors, recent history, flapping endpoints
//! GET    /api/monitors                stored definitions
//! POST   /api/monitors                create + start
//! PUT    /api/monitors/{id}           replace + restart
//! DELETE /api/monitors/{id}           stop + delete
//! POST   /api/monitors/{id}/restore   force back to primary
//! GET    /api/history?limit=          switch log, newest first
//! GET    /api/ip-down?limit=          endpoint-down log, newest first
//! GET    /api/zones                   Cloudflare zones
//! GET    /api/zones/{id}/records      records, optionally ?search=
//! POST   /api/zones/{id}/records      create a record
//! POST   /api/zones/{id}/records/bulk per-record content/ttl/proxied edits
//! PUT    /api/zones/{id}/records/{record_id}
//! DELETE /api/zones/{id}/records/{record_id}
//! GET    /api/config                  live DNS and notification settings
//! POST   /api/config                  replace and persist them
//! GET    /api/cloudflare-accounts     accounts and the active id
//! POST   /api/cloudflare-accounts     add an account
//! PUT    /api/cloudflare-accounts/{id}
//! DELETE /api/cloudflare-accounts/{id}
//! POST   /api/cloudflare-accounts/{id}/activate
//! ```
//!
//! # Design Decisions
//! - Monitor writes go to the store first, then to the engine
//! - Monitor writes and restores are serialized so the store and the
//!   engine never disagree about which monitors exist
//! - Validation errors are returned in full with 400
//! - The configured API key wins; without one the stored login token is
//!   the bearer key, and with neither the API is open

pub mod auth;
pub mod handlers;
pub mod request_id;
pub mod settings;
pub mod zones;

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{IntegrationsConfig, InvalidMonitor};
use crate::dns::{CloudflareDns, DnsError};
use crate::engine::Engine;
use crate::failover::{FailoverSink, RestoreError};
use crate::store::{Store, StoreError};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use self::request_id::RequestIdLayer;
use self::settings::*;
use self::zones::*;

/// Shared handler state.
#[derive(Clone)]
pub struct AdminState {
    pub engine: Arc<Engine>,
    pub store: Arc<Store>,
    pub failover: Arc<FailoverSink>,
    pub dns: Arc<CloudflareDns>,
    pub integrations: Arc<ArcSwap<IntegrationsConfig>>,
    /// Configured key; empty defers to the stored login token.
    pub api_key: Arc<str>,
    pub started_at: Instant,
    /// Held across monitor create, update, delete and restore.
    pub mutations: Arc<Mutex<()>>,
}

impl AdminState {
    pub fn new(
        engine: Arc<Engine>,
        store: Arc<Store>,
        failover: Arc<FailoverSink>,
        dns: Arc<CloudflareDns>,
        integrations: Arc<ArcSwap<IntegrationsConfig>>,
        api_key: &str,
    ) -> Self {
        Self {
            engine,
            store,
            failover,
            dns,
            integrations,
            api_key: Arc::from(api_key),
            started_at: Instant::now(),
            mutations: Arc::new(Mutex::new(())),
        }
    }

    /// The bearer key requests must present, if any.
    pub fn effective_key(&self) -> Option<String> {
        if self.api_key.is_empty() {
            self.store.auth_token()
        } else {
            Some(self.api_key.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    InvalidMonitor(#[from] InvalidMonitor),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Restore(RestoreError),

    #[error(transparent)]
    Dns(#[from] DnsError),
}

impl From<RestoreError> for AdminError {
    fn from(e: RestoreError) -> Self {
        match e {
            RestoreError::NotFound(id) => AdminError::NotFound(format!("monitor not found: {id}")),
            RestoreError::MissingZone(_) => AdminError::BadRequest(e.to_string()),
            other => AdminError::Restore(other),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            AdminError::NotFound(_) => (StatusCode::NOT_FOUND, Vec::new()),
            AdminError::BadRequest(_) => (StatusCode::BAD_REQUEST, Vec::new()),
            AdminError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, Vec::new()),
            AdminError::InvalidMonitor(invalid) => (
                StatusCode::BAD_REQUEST,
                invalid.errors.iter().map(ToString::to_string).collect(),
            ),
            AdminError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, Vec::new()),
            AdminError::Restore(_) => (StatusCode::BAD_GATEWAY, Vec::new()),
            AdminError::Dns(DnsError::MissingCredentials) => (StatusCode::BAD_REQUEST, Vec::new()),
            AdminError::Dns(DnsError::RecordNotFound(_) | DnsError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, Vec::new())
            }
            AdminError::Dns(_) => (StatusCode::BAD_GATEWAY, Vec::new()),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Admin request failed");
        }

        let body = json!({
            "error": self.to_string(),
            "details": details,
        });
        (status, Json(body)).into_response()
    }
}

/// Build the admin router with all middleware layers.
#[allow(deprecated)]
pub fn setup_admin_router(state: AdminState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .route("/api/status", get(get_status))
        .route("/api/monitors", get(list_monitors).post(create_monitor))
        .route("/api/monitors/{id}", put(update_monitor).delete(delete_monitor))
        .route("/api/monitors/{id}/restore", post(restore_monitor))
        .route("/api/history", get(get_history))
        .route("/api/ip-down", get(get_ip_down))
        .route("/api/zones", get(list_zones))
        .route("/api/zones/{id}/records", get(list_records).post(create_record))
        .route("/api/zones/{id}/records/bulk", post(bulk_update_records))
        .route(
            "/api/zones/{id}/records/{record_id}",
            put(update_record).delete(delete_record),
        )
        .route("/api/config", get(get_config).post(update_config))
        .route("/api/cloudflare-accounts", get(list_accounts).post(create_account))
        .route(
            "/api/cloudflare-accounts/{id}",
            put(update_account).delete(delete_account),
        )
        .route("/api/cloudflare-accounts/{id}/activate", post(activate_account))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/auth/login", post(login))
        .route("/api/auth/status", get(auth_status))
        .merge(api)
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(RequestIdLayer)
}
