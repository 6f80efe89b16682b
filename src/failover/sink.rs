//! `EventSink` implementation driving DNS, history and alerts.

use async_trait::async_trait;

use super::FailoverSink;
use crate::config::MonitorConfig;
use crate::engine::EventSink;
use crate::health::EndpointRole;
use crate::store::events::now_ms;
use crate::store::{IpDownEvent, SwitchEvent, SwitchReason};

impl FailoverSink {
    fn record_switch(&self, monitor: &MonitorConfig, from_ip: &str, to_ip: &str, to_backup: bool, reason: SwitchReason) {
        let event = SwitchEvent {
            timestamp: now_ms(),
            monitor_id: monitor.id.clone(),
            name: monitor.name.clone(),
            from_ip: from_ip.to_string(),
            to_ip: to_ip.to_string(),
            to_backup,
            check_type: monitor.check_type.clone(),
            reason,
        };
        if let Err(e) = self.store.append_switch_event(event, self.limits.history) {
            tracing::error!(monitor_id = %monitor.id, error = %e, "Failed to persist switch event");
        }
    }

    async fn apply_dns(&self, monitor: &MonitorConfig, ip: &str, proxied: bool) {
        if monitor.zone_id.is_empty() || ip.is_empty() {
            tracing::debug!(monitor_id = %monitor.id, "No zone or target IP, DNS update skipped");
            return;
        }
        // Failures are logged per record.
        let _ = self.update_subdomains(monitor, ip, proxied).await;
    }
}

#[async_trait]
impl EventSink for FailoverSink {
    async fn on_switch(&self, monitor: &MonitorConfig, to_backup: bool) {
        let (from_ip, to_ip, proxied, reason, message) = if to_backup {
            (
                &monitor.original_ip,
                &monitor.backup_ip,
                monitor.backup_ip_cdn_enabled,
                SwitchReason::Failover,
                format!("Server {} is down, switched to backup IP {}", monitor.name, monitor.backup_ip),
            )
        } else {
            (
                &monitor.backup_ip,
                &monitor.original_ip,
                monitor.original_ip_cdn_enabled,
                SwitchReason::Restore,
                format!("Server {} recovered, switched back to original IP {}", monitor.name, monitor.original_ip),
            )
        };

        tracing::info!(monitor_id = %monitor.id, from = %from_ip, to = %to_ip, reason = reason.as_str(), "Applying switch");
        self.alerter.send(&message).await;
        self.record_switch(monitor, from_ip, to_ip, to_backup, reason);
        self.apply_dns(monitor, to_ip, proxied).await;
    }

    async fn on_scheduled_switch(&self, monitor: &MonitorConfig, from_ip: &str, to_ip: &str) {
        let proxied = monitor.proxied_for(to_ip);
        let message = format!("Scheduled switch: {} {} -> {}", monitor.name, from_ip, to_ip);

        tracing::info!(monitor_id = %monitor.id, from = %from_ip, to = %to_ip, "Applying scheduled switch");
        self.alerter.send(&message).await;
        self.record_switch(monitor, from_ip, to_ip, to_ip == monitor.backup_ip, SwitchReason::Schedule);
        self.apply_dns(monitor, to_ip, proxied).await;
    }

    async fn on_ip_down(&self, monitor: &MonitorConfig, ip: &str, role: EndpointRole) {
        let event = IpDownEvent {
            timestamp: now_ms(),
            monitor_id: monitor.id.clone(),
            name: monitor.name.clone(),
            ip: ip.to_string(),
            role,
        };
        if let Err(e) = self.store.append_ip_down(event, self.limits.ip_down) {
            tracing::error!(monitor_id = %monitor.id, error = %e, "Failed to persist ip-down event");
        }

        if role == EndpointRole::Backup {
            let message = format!(
                "Backup IP {} of {} is also down while failed over",
                ip, monitor.name
            );
            self.alerter.send(&message).await;
        }
    }
}
