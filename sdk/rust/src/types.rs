use serde::{Deserialize, Serialize};

/// Monitor definition as stored and accepted by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorDefinition {
    pub id: String,
    pub name: String,
    pub zone_id: String,
    pub subdomains: Vec<String>,
    pub check_type: String,
    pub check_target: String,
    pub original_ip: String,
    pub backup_ip: String,
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub ping_count: u32,
    pub interval: u64,
    pub timeout_seconds: u64,
    pub original_ip_cdn_enabled: bool,
    pub backup_ip_cdn_enabled: bool,
    pub schedule_enabled: bool,
    pub schedule_hours: u64,
    pub schedule_switch_ip: String,
}

/// Live state of one running monitor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonitorState {
    pub id: String,
    pub name: String,
    /// `Normal` or `Down`.
    pub status: String,
    pub current_ip: String,
    pub original_ip: String,
    pub backup_ip: String,
    pub fail_count: u32,
    pub succ_count: u32,
    pub backup_fail_count: u32,
    pub backup_down: bool,
    pub check_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SwitchRecord {
    pub timestamp: i64,
    pub monitor_id: String,
    pub name: String,
    pub from_ip: String,
    pub to_ip: String,
    pub to_backup: bool,
    pub check_type: String,
    /// `failover`, `restore` or `schedule`.
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IpDownRecord {
    pub timestamp: i64,
    pub monitor_id: String,
    pub name: String,
    pub ip: String,
    /// `original` or `backup`.
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OfflineHot {
    pub monitor_id: String,
    pub name: String,
    pub ip: String,
    pub role: String,
    pub count: usize,
    pub last_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SystemInfo {
    pub version: String,
    pub uptime_seconds: u64,
    pub active_monitors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    pub monitors: Vec<MonitorState>,
    pub history: Vec<SwitchRecord>,
    pub offline_hot: Vec<OfflineHot>,
    pub system: SystemInfo,
}

/// Error body returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiErrorBody {
    pub error: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub proxied: bool,
    pub ttl: u32,
}

/// Record create or full replace. `ttl == 1` means automatic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordInput {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
}

/// One bulk edit; empty content, zero ttl and `None` proxied keep the
/// record's current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkUpdate {
    pub record_id: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BulkResult {
    pub record_id: String,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudflareAccount {
    pub id: String,
    pub name: String,
    pub api_token: String,
    pub api_key: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountList {
    pub accounts: Vec<CloudflareAccount>,
    pub active_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthStatus {
    pub has_token: bool,
    pub need_setup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResult {
    pub authenticated: bool,
    pub token_created: bool,
}

/// DNS and notification settings, as served by `/api/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cloudflare: CloudflareSettings,
    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudflareSettings {
    pub api_token: String,
    pub api_key: String,
    pub email: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub dingtalk: DingTalkSettings,
    pub telegram: TelegramSettings,
    pub webhook: WebhookSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DingTalkSettings {
    pub enabled: bool,
    pub access_token: String,
    pub secret: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    pub enabled: bool,
    pub url: String,
}
