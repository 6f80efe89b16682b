use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AdminError, AdminState};
use crate::config::{validate_monitor, MonitorConfig};
use crate::engine::MonitorStatusView;
use crate::store::events::start_of_today_ms;
use crate::store::{offline_hot, IpDownEvent, OfflineHot, SwitchEvent};

const STATUS_HISTORY: usize = 50;
const DEFAULT_HISTORY_LIMIT: usize = 50;
const DEFAULT_IP_DOWN_LIMIT: usize = 200;
/// Window scanned for today's outages.
const OFFLINE_HOT_SCAN: usize = 2000;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub active_monitors: usize,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub monitors: Vec<MonitorStatusView>,
    pub history: Vec<SwitchEvent>,
    pub offline_hot: Vec<OfflineHot>,
    pub system: SystemStatus,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RestoreRequest {
    pub proxied: Option<bool>,
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn get_status(State(state): State<AdminState>) -> Json<StatusResponse> {
    let monitors = state.engine.status().await;
    let ip_down = state.store.ip_down_events(OFFLINE_HOT_SCAN);

    Json(StatusResponse {
        system: SystemStatus {
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            active_monitors: monitors.len(),
        },
        monitors,
        history: state.store.switch_history(STATUS_HISTORY),
        offline_hot: offline_hot(&ip_down, start_of_today_ms()),
    })
}

pub async fn list_monitors(State(state): State<AdminState>) -> Json<Vec<MonitorConfig>> {
    Json(state.store.list_monitors())
}

pub async fn create_monitor(
    State(state): State<AdminState>,
    Json(mut monitor): Json<MonitorConfig>,
) -> Result<(StatusCode, Json<MonitorConfig>), AdminError> {
    if monitor.id.trim().is_empty() {
        monitor.id = Uuid::new_v4().to_string();
    }
    if monitor.check_type.trim().is_empty() {
        monitor.check_type = "ping".to_string();
    }

    let _guard = state.mutations.lock().await;
    save_and_start(&state, &monitor).await?;
    tracing::info!(monitor_id = %monitor.id, name = %monitor.name, "Monitor created");
    Ok((StatusCode::CREATED, Json(monitor)))
}

pub async fn update_monitor(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    Json(mut monitor): Json<MonitorConfig>,
) -> Result<Json<MonitorConfig>, AdminError> {
    let _guard = state.mutations.lock().await;
    if state.store.get_monitor(&id).is_none() {
        return Err(AdminError::NotFound(format!("monitor not found: {id}")));
    }
    monitor.id = id;

    save_and_start(&state, &monitor).await?;
    tracing::info!(monitor_id = %monitor.id, "Monitor updated");
    Ok(Json(monitor))
}

pub async fn delete_monitor(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AdminError> {
    let _guard = state.mutations.lock().await;
    state.engine.stop_monitor(&id).await;
    if !state.store.delete_monitor(&id)? {
        return Err(AdminError::NotFound(format!("monitor not found: {id}")));
    }
    tracing::info!(monitor_id = %id, "Monitor deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_monitor(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<SwitchEvent>, AdminError> {
    let request: RestoreRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RestoreRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AdminError::BadRequest(e.to_string()))?
    };

    let _guard = state.mutations.lock().await;
    let event = state
        .failover
        .restore_monitor(&state.engine, &id, request.proxied)
        .await?;
    Ok(Json(event))
}

pub async fn get_history(
    State(state): State<AdminState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<SwitchEvent>> {
    Json(state.store.switch_history(query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT)))
}

pub async fn get_ip_down(
    State(state): State<AdminState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<IpDownEvent>> {
    Json(state.store.ip_down_events(query.limit.unwrap_or(DEFAULT_IP_DOWN_LIMIT)))
}

/// Validate, persist, then (re)start. Nothing is stored for an invalid monitor.
async fn save_and_start(state: &AdminState, monitor: &MonitorConfig) -> Result<(), AdminError> {
    validate_monitor(monitor)?;
    state.store.upsert_monitor(monitor.clone())?;
    state.engine.start_monitor(monitor).await?;
    Ok(())
}
