//! Outbound notifications.
//!
//! # Responsibilities
//! - Fan a plain-text message out to every enabled channel
//! - Log and count per-channel failures
//!
//! # Design Decisions
//! - Channels are sent concurrently; one slow channel never delays another
//! - Delivery failures never propagate to the caller
//! - Channel settings are read per message so reloads apply immediately

pub mod channels;

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use futures_util::future::{join_all, BoxFuture, FutureExt};

use crate::config::IntegrationsConfig;
use crate::observability::metrics;

pub use channels::AlertError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends operator alerts.
#[async_trait]
pub trait Alerter: Send + Sync {
    async fn send(&self, message: &str);
}

/// Fan-out over the configured channels.
pub struct Notifier {
    http: reqwest::Client,
    config: Arc<ArcSwap<IntegrationsConfig>>,
}

impl Notifier {
    pub fn new(config: Arc<ArcSwap<IntegrationsConfig>>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build tuned HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self { http, config }
    }
}

#[async_trait]
impl Alerter for Notifier {
    async fn send(&self, message: &str) {
        let config = self.config.load_full();
        let settings = &config.notifications;
        let mut sends: Vec<(&'static str, BoxFuture<'_, Result<(), AlertError>>)> = Vec::new();

        if settings.dingtalk.enabled && !settings.dingtalk.access_token.is_empty() {
            sends.push((
                "dingtalk",
                channels::send_dingtalk(&self.http, &settings.dingtalk, message).boxed(),
            ));
        }
        if settings.telegram.enabled
            && !settings.telegram.bot_token.is_empty()
            && !settings.telegram.chat_id.is_empty()
        {
            sends.push((
                "telegram",
                channels::send_telegram(&self.http, &settings.telegram, message).boxed(),
            ));
        }
        if settings.webhook.enabled && !settings.webhook.url.is_empty() {
            sends.push((
                "webhook",
                channels::send_webhook(&self.http, &settings.webhook, message).boxed(),
            ));
        }

        if sends.is_empty() {
            tracing::debug!("No notification channel enabled");
            return;
        }

        let (names, futures): (Vec<_>, Vec<_>) = sends.into_iter().unzip();
        for (channel, result) in names.into_iter().zip(join_all(futures).await) {
            match result {
                Ok(()) => {
                    metrics::record_notification(channel, true);
                    tracing::debug!(channel, "Notification sent");
                }
                Err(e) => {
                    metrics::record_notification(channel, false);
                    tracing::warn!(channel, error = %e, "Notification failed");
                }
            }
        }
    }
}
