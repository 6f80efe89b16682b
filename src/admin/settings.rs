use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AdminError, AdminState};
use crate::config::IntegrationsConfig;
use crate::store::CloudflareAccount;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub authenticated: bool,
    /// True when this call stored the first token.
    pub token_created: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub has_token: bool,
    pub need_setup: bool,
}

#[derive(Debug, Serialize)]
pub struct AccountList {
    pub accounts: Vec<CloudflareAccount>,
    pub active_id: Option<String>,
}

/// Verify a token, or store it when none exists yet.
pub async fn login(
    State(state): State<AdminState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AdminError> {
    let token = request.token.trim();
    if token.is_empty() {
        return Err(AdminError::BadRequest("token is required".to_string()));
    }

    let _guard = state.mutations.lock().await;
    match state.effective_key() {
        Some(expected) if expected == token => Ok(Json(LoginResponse {
            authenticated: true,
            token_created: false,
        })),
        Some(_) => {
            tracing::warn!("Rejected login: wrong token");
            Err(AdminError::Unauthorized("invalid token".to_string()))
        }
        None => {
            state.store.set_auth_token(token)?;
            tracing::info!("Admin token created");
            Ok(Json(LoginResponse {
                authenticated: true,
                token_created: true,
            }))
        }
    }
}

pub async fn auth_status(State(state): State<AdminState>) -> Json<AuthStatus> {
    let has_token = state.effective_key().is_some();
    Json(AuthStatus {
        has_token,
        need_setup: !has_token,
    })
}

pub async fn get_config(State(state): State<AdminState>) -> Json<IntegrationsConfig> {
    Json(state.integrations.load().as_ref().clone())
}

/// Replace the live DNS and notification settings and persist them so they
/// outlive the config file's values.
pub async fn update_config(
    State(state): State<AdminState>,
    Json(config): Json<IntegrationsConfig>,
) -> Result<Json<IntegrationsConfig>, AdminError> {
    state.store.set_integrations(config.clone())?;
    state.integrations.store(Arc::new(config.clone()));
    tracing::info!("Integration settings updated through the admin API");
    Ok(Json(config))
}

pub async fn list_accounts(State(state): State<AdminState>) -> Json<AccountList> {
    Json(AccountList {
        accounts: state.store.list_accounts(),
        active_id: state.store.active_account_id(),
    })
}

pub async fn create_account(
    State(state): State<AdminState>,
    Json(mut account): Json<CloudflareAccount>,
) -> Result<(StatusCode, Json<CloudflareAccount>), AdminError> {
    check_account(&account)?;
    if account.id.trim().is_empty() {
        account.id = Uuid::new_v4().to_string();
    }
    if state.store.list_accounts().iter().any(|a| a.id == account.id) {
        return Err(AdminError::BadRequest(format!(
            "account already exists: {}",
            account.id
        )));
    }

    state.store.add_account(account.clone())?;
    tracing::info!(account_id = %account.id, name = %account.name, "Cloudflare account added");
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn update_account(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    Json(mut account): Json<CloudflareAccount>,
) -> Result<Json<CloudflareAccount>, AdminError> {
    check_account(&account)?;
    account.id = id;
    if !state.store.update_account(account.clone())? {
        return Err(account_not_found(&account.id));
    }
    tracing::info!(account_id = %account.id, "Cloudflare account updated");
    Ok(Json(account))
}

pub async fn delete_account(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AdminError> {
    if !state.store.delete_account(&id)? {
        return Err(account_not_found(&id));
    }
    tracing::info!(
        account_id = %id,
        active = ?state.store.active_account_id(),
        "Cloudflare account deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate_account(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<AccountList>, AdminError> {
    if !state.store.activate_account(&id)? {
        return Err(account_not_found(&id));
    }
    tracing::info!(account_id = %id, "Cloudflare account activated");
    Ok(list_accounts(State(state)).await)
}

fn check_account(account: &CloudflareAccount) -> Result<(), AdminError> {
    let has_token = !account.api_token.is_empty();
    let has_key = !account.api_key.is_empty() && !account.email.is_empty();
    if has_token || has_key {
        Ok(())
    } else {
        Err(AdminError::BadRequest(
            "api_token or api_key + email is required".to_string(),
        ))
    }
}

fn account_not_found(id: &str) -> AdminError {
    AdminError::NotFound(format!("account not found: {id}"))
}
