//! Individual notification channels.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use thiserror::Error;

use crate::config::schema::{DingTalkConfig, TelegramConfig, WebhookConfig};

const DINGTALK_URL: &str = "https://oapi.dingtalk.com/robot/send";
const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("channel returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("signing failed: {0}")]
    Signing(String),
}

/// DingTalk robot signature: base64(HMAC-SHA256(secret, "{timestamp}\n{secret}")).
pub fn dingtalk_sign(secret: &str, timestamp_ms: i64) -> Result<String, AlertError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| AlertError::Signing(e.to_string()))?;
    mac.update(format!("{timestamp_ms}\n{secret}").as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

pub async fn send_dingtalk(
    http: &reqwest::Client,
    config: &DingTalkConfig,
    message: &str,
) -> Result<(), AlertError> {
    let mut query = vec![("access_token", config.access_token.clone())];
    if !config.secret.is_empty() {
        let timestamp = chrono::Utc::now().timestamp_millis();
        query.push(("timestamp", timestamp.to_string()));
        query.push(("sign", dingtalk_sign(&config.secret, timestamp)?));
    }

    let payload = json!({
        "msgtype": "text",
        "text": { "content": message },
    });
    let response = http.post(DINGTALK_URL).query(&query).json(&payload).send().await?;
    check_status(response.status())
}

pub async fn send_telegram(
    http: &reqwest::Client,
    config: &TelegramConfig,
    message: &str,
) -> Result<(), AlertError> {
    let base = config.api_base.as_deref().unwrap_or(TELEGRAM_API).trim_end_matches('/');
    let url = format!("{base}/bot{}/sendMessage", config.bot_token);
    let payload = json!({
        "chat_id": config.chat_id,
        "text": message,
    });
    let response = http.post(url).json(&payload).send().await?;
    check_status(response.status())
}

pub async fn send_webhook(
    http: &reqwest::Client,
    config: &WebhookConfig,
    message: &str,
) -> Result<(), AlertError> {
    let response = http.post(&config.url).json(&json!({ "text": message })).send().await?;
    check_status(response.status())
}

fn check_status(status: reqwest::StatusCode) -> Result<(), AlertError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(AlertError::Status(status))
    }
}
