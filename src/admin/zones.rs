use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{AdminError, AdminState};
use crate::dns::{BulkResult, BulkUpdate, DnsRecord, RecordInput, Zone};

#[derive(Debug, Deserialize)]
pub struct RecordQuery {
    pub search: Option<String>,
}

pub async fn list_zones(State(state): State<AdminState>) -> Result<Json<Vec<Zone>>, AdminError> {
    Ok(Json(state.dns.list_zones().await?))
}

pub async fn list_records(
    State(state): State<AdminState>,
    Path(zone_id): Path<String>,
    Query(query): Query<RecordQuery>,
) -> Result<Json<Vec<DnsRecord>>, AdminError> {
    let records = match query.search.as_deref().map(str::trim) {
        Some(search) if !search.is_empty() => state.dns.search_records(&zone_id, search).await?,
        _ => state.dns.list_records(&zone_id, None).await?,
    };
    Ok(Json(records))
}

pub async fn create_record(
    State(state): State<AdminState>,
    Path(zone_id): Path<String>,
    Json(input): Json<RecordInput>,
) -> Result<(StatusCode, Json<DnsRecord>), AdminError> {
    check_input(&input)?;
    let record = state.dns.create_record(&zone_id, &input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_record(
    State(state): State<AdminState>,
    Path((zone_id, record_id)): Path<(String, String)>,
    Json(input): Json<RecordInput>,
) -> Result<Json<DnsRecord>, AdminError> {
    check_input(&input)?;
    let record = state
        .dns
        .update_record_by_id(&zone_id, &record_id, &input)
        .await?;
    Ok(Json(record))
}

pub async fn delete_record(
    State(state): State<AdminState>,
    Path((zone_id, record_id)): Path<(String, String)>,
) -> Result<StatusCode, AdminError> {
    state.dns.delete_record(&zone_id, &record_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Per-entry outcomes; the request itself succeeds even when entries fail.
pub async fn bulk_update_records(
    State(state): State<AdminState>,
    Path(zone_id): Path<String>,
    Json(updates): Json<Vec<BulkUpdate>>,
) -> Result<Json<Vec<BulkResult>>, AdminError> {
    if updates.iter().any(|u| u.record_id.trim().is_empty()) {
        return Err(AdminError::BadRequest("record_id is required".to_string()));
    }
    Ok(Json(state.dns.bulk_update(&zone_id, &updates).await))
}

fn check_input(input: &RecordInput) -> Result<(), AdminError> {
    for (field, value) in [
        ("type", &input.record_type),
        ("name", &input.name),
        ("content", &input.content),
    ] {
        if value.trim().is_empty() {
            return Err(AdminError::BadRequest(format!("{field} is required")));
        }
    }
    Ok(())
}
