//! State-transition events and their delivery.
//!
//! # Data Flow
//! ```text
//! check / schedule loops
//!     → MonitorEvent on the monitor's unbounded channel (never blocks a loop)
//!     → that monitor's dispatcher task
//!     → EventSink, awaited one event at a time
//! ```
//!
//! # Design Decisions
//! - One dispatcher per monitor: delivery is FIFO within a monitor and a
//!   stalled sink call never holds up another monitor
//! - Sink failures are the sink's business; the engine never rolls back

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::MonitorConfig;
use crate::health::EndpointRole;

/// Receives state transitions. Implementations perform DNS updates,
/// notifications and persistence.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Health-driven switch. `to_backup` is true on failover.
    async fn on_switch(&self, monitor: &MonitorConfig, to_backup: bool);

    /// Timer-driven switch between two concrete IPs.
    async fn on_scheduled_switch(&self, monitor: &MonitorConfig, from_ip: &str, to_ip: &str);

    /// An endpoint was declared down.
    async fn on_ip_down(&self, monitor: &MonitorConfig, ip: &str, role: EndpointRole);
}

/// A transition produced by a monitor loop.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    Switched {
        monitor: Arc<MonitorConfig>,
        to_backup: bool,
    },
    ScheduledSwitch {
        monitor: Arc<MonitorConfig>,
        from_ip: String,
        to_ip: String,
    },
    IpDown {
        monitor: Arc<MonitorConfig>,
        ip: String,
        role: EndpointRole,
    },
}

impl MonitorEvent {
    pub fn monitor_id(&self) -> &str {
        match self {
            MonitorEvent::Switched { monitor, .. }
            | MonitorEvent::ScheduledSwitch { monitor, .. }
            | MonitorEvent::IpDown { monitor, .. } => &monitor.id,
        }
    }
}

/// Spawn the dispatcher. It drains the channel until every sender is gone.
pub(crate) fn spawn_dispatcher(
    sink: Arc<dyn EventSink>,
    mut rx: mpsc::UnboundedReceiver<MonitorEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            tracing::debug!(monitor_id = %event.monitor_id(), event = ?event, "Dispatching event");
            deliver(sink.as_ref(), event).await;
        }
        tracing::debug!("Event dispatcher stopped");
    })
}

async fn deliver(sink: &dyn EventSink, event: MonitorEvent) {
    match event {
        MonitorEvent::Switched { monitor, to_backup } => sink.on_switch(&monitor, to_backup).await,
        MonitorEvent::ScheduledSwitch {
            monitor,
            from_ip,
            to_ip,
        } => sink.on_scheduled_switch(&monitor, &from_ip, &to_ip).await,
        MonitorEvent::IpDown { monitor, ip, role } => sink.on_ip_down(&monitor, &ip, role).await,
    }
}
