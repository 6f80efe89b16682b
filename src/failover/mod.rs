//! Side effects of monitor transitions.
//!
//! # Data Flow
//! ```text
//! MonitorEvent (from the engine dispatcher)
//!     → FailoverSink
//!     → notification, store entry, DNS update of every subdomain
//!
//! Admin restore
//!     → Engine::force_restore
//!     → FailoverSink::restore_monitor (DNS, history, notification)
//! ```
//!
//! # Design Decisions
//! - Failures are logged and counted here; nothing flows back to the engine
//! - DNS is skipped when there is no zone or no target IP

pub mod restore;
pub mod sink;

use std::sync::Arc;

use crate::alerts::Alerter;
use crate::config::MonitorConfig;
use crate::dns::{DnsError, DnsProvider};
use crate::observability::metrics;
use crate::store::Store;

pub use restore::RestoreError;

/// Retention for the store's event logs.
#[derive(Debug, Clone, Copy)]
pub struct EventLimits {
    pub history: usize,
    pub ip_down: usize,
}

impl Default for EventLimits {
    fn default() -> Self {
        Self {
            history: 200,
            ip_down: 2000,
        }
    }
}

/// Applies transitions to DNS, the store and the alert channels.
pub struct FailoverSink {
    dns: Arc<dyn DnsProvider>,
    alerter: Arc<dyn Alerter>,
    store: Arc<Store>,
    limits: EventLimits,
}

impl FailoverSink {
    pub fn new(
        dns: Arc<dyn DnsProvider>,
        alerter: Arc<dyn Alerter>,
        store: Arc<Store>,
        limits: EventLimits,
    ) -> Self {
        Self {
            dns,
            alerter,
            store,
            limits,
        }
    }

    /// Point every subdomain of `monitor` at `ip`. Tries all of them and
    /// returns the first failure.
    async fn update_subdomains(
        &self,
        monitor: &MonitorConfig,
        ip: &str,
        proxied: bool,
    ) -> Result<(), DnsError> {
        let mut first_error = None;

        for subdomain in &monitor.subdomains {
            match self
                .dns
                .update_record(&monitor.zone_id, subdomain, ip, proxied)
                .await
            {
                Ok(()) => metrics::record_dns_update(true),
                Err(e) => {
                    metrics::record_dns_update(false);
                    tracing::error!(
                        monitor_id = %monitor.id,
                        record = %subdomain,
                        ip = %ip,
                        error = %e,
                        "Failed to update DNS record"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
