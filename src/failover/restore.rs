//! Administrative restore to the primary endpoint.

use thiserror::Error;

use super::FailoverSink;
use crate::dns::DnsError;
use crate::engine::Engine;
use crate::observability::metrics;
use crate::store::events::now_ms;
use crate::store::{SwitchEvent, SwitchReason};

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("monitor not found: {0}")]
    NotFound(String),

    #[error("monitor {0} has no zone_id")]
    MissingZone(String),

    #[error(transparent)]
    Dns(#[from] DnsError),
}

impl FailoverSink {
    /// Force a monitor back to its primary IP and apply the DNS change.
    ///
    /// `proxied` overrides the monitor's `original_ip_cdn_enabled` flag.
    /// The engine state is reset even when the DNS update then fails.
    pub async fn restore_monitor(
        &self,
        engine: &Engine,
        id: &str,
        proxied: Option<bool>,
    ) -> Result<SwitchEvent, RestoreError> {
        let monitor = self
            .store
            .get_monitor(id)
            .ok_or_else(|| RestoreError::NotFound(id.to_string()))?;
        if monitor.zone_id.is_empty() {
            return Err(RestoreError::MissingZone(id.to_string()));
        }

        let from_ip = engine
            .force_restore(id)
            .await
            .filter(|ip| !ip.is_empty())
            .unwrap_or_else(|| monitor.backup_ip.clone());
        let proxied = proxied.unwrap_or(monitor.original_ip_cdn_enabled);

        self.update_subdomains(&monitor, &monitor.original_ip, proxied)
            .await?;

        let event = SwitchEvent {
            timestamp: now_ms(),
            monitor_id: monitor.id.clone(),
            name: monitor.name.clone(),
            from_ip,
            to_ip: monitor.original_ip.clone(),
            to_backup: false,
            check_type: monitor.check_type.clone(),
            reason: SwitchReason::Restore,
        };
        if let Err(e) = self.store.append_switch_event(event.clone(), self.limits.history) {
            tracing::error!(monitor_id = %id, error = %e, "Failed to persist restore event");
        }
        metrics::record_switch("manual");

        let message = format!(
            "Manual restore: {} switched back to primary IP {}",
            monitor.name, monitor.original_ip
        );
        self.alerter.send(&message).await;

        tracing::info!(monitor_id = %id, from = %event.from_ip, to = %event.to_ip, proxied, "Monitor restored manually");
        Ok(event)
    }
}
