//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files; the
//! monitor definitions are also the shape persisted by the store and accepted
//! by the admin API.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Admin API settings.
    pub server: ServerConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Monitor and event persistence.
    pub store: StoreConfig,

    /// DNS provider credentials.
    pub cloudflare: CloudflareConfig,

    /// Outbound alert channels.
    pub notifications: NotificationsConfig,

    /// Seed monitors, imported when the store holds none.
    pub monitors: Vec<MonitorConfig>,
}

impl AppConfig {
    /// The part of the configuration that can change without a restart.
    pub fn integrations(&self) -> IntegrationsConfig {
        IntegrationsConfig {
            cloudflare: self.cloudflare.clone(),
            notifications: self.notifications.clone(),
        }
    }
}

/// Hot-reloadable collaborator settings. Also the body of the runtime
/// config endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    pub cloudflare: CloudflareConfig,
    pub notifications: NotificationsConfig,
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8081").
    pub bind_address: String,

    /// API key for authentication (Bearer token). Empty disables auth.
    pub api_key: String,

    /// Admin request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8081".to_string(),
            api_key: String::new(),
            request_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON data file holding monitors and event logs.
    pub path: String,

    /// Switch history entries kept.
    pub history_limit: usize,

    /// IP-down events kept.
    pub ip_down_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "data.json".to_string(),
            history_limit: 200,
            ip_down_limit: 2000,
        }
    }
}

/// Cloudflare API credentials. A token takes precedence over key + email.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CloudflareConfig {
    pub api_token: String,
    pub api_key: String,
    pub email: String,
    /// API root, overridable for testing.
    pub api_base: String,
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            api_key: String::new(),
            email: String::new(),
            api_base: "https://api.cloudflare.com/client/v4".to_string(),
        }
    }
}

/// Alert channel settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationsConfig {
    pub dingtalk: DingTalkConfig,
    pub telegram: TelegramConfig,
    pub webhook: WebhookConfig,
}

/// DingTalk group robot.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DingTalkConfig {
    pub enabled: bool,
    pub access_token: String,
    /// Signing secret; requests are signed when set.
    pub secret: String,
}

/// Telegram bot.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
    /// Bot API root, overridable for testing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// Generic JSON webhook receiving `{"text": ...}`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: String,
}

/// Definition of one watched primary/backup pair.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Unique monitor identifier.
    pub id: String,

    /// Display name for logs and alerts.
    pub name: String,

    /// DNS zone holding `subdomains`.
    pub zone_id: String,

    /// Record names rewritten on every switch.
    pub subdomains: Vec<String>,

    /// ping (default), http, https, tcp or tcping.
    pub check_type: String,

    /// IP/host for ping, URL for http(s), host:port for tcp.
    pub check_target: String,

    /// Primary endpoint.
    pub original_ip: String,

    /// Fallback endpoint. Empty disables failover DNS updates.
    pub backup_ip: String,

    /// Consecutive failures before failing over.
    pub failure_threshold: u32,

    /// Consecutive successes before restoring.
    pub success_threshold: u32,

    /// Echo requests per ping probe.
    pub ping_count: u32,

    /// Check interval in seconds.
    pub interval: u64,

    /// Probe timeout in seconds.
    pub timeout_seconds: u64,

    /// Proxy/CDN flag applied when the record points at the primary.
    pub original_ip_cdn_enabled: bool,

    /// Proxy/CDN flag applied when the record points at the backup.
    pub backup_ip_cdn_enabled: bool,

    /// Enable timer-driven switching.
    pub schedule_enabled: bool,

    /// Schedule period in hours.
    pub schedule_hours: u64,

    /// Explicit scheduled target; toggles primary/backup when empty.
    pub schedule_switch_ip: String,
}

impl MonitorConfig {
    /// Proxied flag for a record pointing at `ip`.
    pub fn proxied_for(&self, ip: &str) -> bool {
        if ip == self.original_ip {
            self.original_ip_cdn_enabled
        } else if ip == self.backup_ip {
            self.backup_ip_cdn_enabled
        } else {
            false
        }
    }
}
