//! Persisted event records and their aggregation.

use std::collections::HashMap;

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::health::EndpointRole;

/// Minimum same-day outages for an endpoint to count as flapping.
pub const OFFLINE_HOT_MIN_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchReason {
    Failover,
    Restore,
    Schedule,
}

impl SwitchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchReason::Failover => "failover",
            SwitchReason::Restore => "restore",
            SwitchReason::Schedule => "schedule",
        }
    }
}

/// One DNS switch, health-driven, scheduled or manual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchEvent {
    /// Unix milliseconds.
    pub timestamp: i64,
    pub monitor_id: String,
    pub name: String,
    pub from_ip: String,
    pub to_ip: String,
    pub to_backup: bool,
    pub check_type: String,
    pub reason: SwitchReason,
}

/// One endpoint declared down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpDownEvent {
    /// Unix milliseconds.
    pub timestamp: i64,
    pub monitor_id: String,
    pub name: String,
    pub ip: String,
    pub role: EndpointRole,
}

/// Repeated outages of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineHot {
    pub monitor_id: String,
    pub name: String,
    pub ip: String,
    pub role: EndpointRole,
    pub count: usize,
    pub last_at: i64,
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Local midnight of the current day, in Unix milliseconds.
pub fn start_of_today_ms() -> i64 {
    let today = Local::now().date_naive();
    today
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(|midnight| midnight.timestamp_millis())
        .unwrap_or_else(now_ms)
}

/// Group ip-down events at or after `since_ms` by (monitor, ip, role) and
/// keep the groups seen at least `OFFLINE_HOT_MIN_COUNT` times, most
/// frequent first, then most recent first.
pub fn offline_hot(events: &[IpDownEvent], since_ms: i64) -> Vec<OfflineHot> {
    let mut groups: HashMap<(&str, &str, EndpointRole), OfflineHot> = HashMap::new();

    for event in events.iter().filter(|e| e.timestamp >= since_ms) {
        let entry = groups
            .entry((event.monitor_id.as_str(), event.ip.as_str(), event.role))
            .or_insert_with(|| OfflineHot {
                monitor_id: event.monitor_id.clone(),
                name: event.name.clone(),
                ip: event.ip.clone(),
                role: event.role,
                count: 0,
                last_at: event.timestamp,
            });
        entry.count += 1;
        entry.last_at = entry.last_at.max(event.timestamp);
    }

    let mut hot: Vec<_> = groups
        .into_values()
        .filter(|g| g.count >= OFFLINE_HOT_MIN_COUNT)
        .collect();
    hot.sort_by(|a, b| b.count.cmp(&a.count).then(b.last_at.cmp(&a.last_at)));
    hot
}
