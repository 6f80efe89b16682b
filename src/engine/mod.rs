//! Monitoring engine.
//!
//! # Data Flow
//! ```text
//! MonitorConfig
//!     → validate_monitor → MonitorSpec
//!     → start_monitor: register Monitor, spawn check loop (+ schedule loop)
//!     → loops probe on a timer, drive the state machine under the monitor lock
//!     → transitions become MonitorEvents → the monitor's dispatcher → EventSink
//! ```
//!
//! # Design Decisions
//! - Registry is a tokio RwLock; replacing an id happens under its write lock
//! - Each slot owns a stop channel and the loop handles it aborts on stop
//! - Each monitor has its own dispatcher: a slow sink call delays only that
//!   monitor's events. A stopped monitor's dispatcher drains what was already
//!   queued, then exits
//! - All loops also observe the process-wide shutdown receiver

pub mod events;
pub mod monitor;
pub(crate) mod runner;
pub mod spec;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;

use crate::config::validation::{validate_monitor, InvalidMonitor};
use crate::config::MonitorConfig;
use crate::health::Prober;
use crate::observability::metrics;

pub use events::{EventSink, MonitorEvent};
pub use monitor::{Monitor, MonitorStatusView};
pub use spec::{BackupWatch, MonitorSpec, ScheduleSpec};

use runner::LoopContext;

/// How long `stop_all` waits for queued events to reach the sink.
const DRAIN_GRACE: Duration = Duration::from_secs(10);

/// A registered monitor and the tasks that drive it.
struct MonitorSlot {
    monitor: Arc<Monitor>,
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    dispatcher: JoinHandle<()>,
}

impl MonitorSlot {
    /// Abort the loops. Their event senders drop with them, so the returned
    /// dispatcher finishes the queued events and exits on its own.
    fn stop(self) -> JoinHandle<()> {
        let _ = self.stop_tx.send(true);
        for task in self.tasks {
            task.abort();
        }
        self.dispatcher
    }
}

/// Registry of running monitors.
pub struct Engine {
    prober: Arc<dyn Prober>,
    sink: Arc<dyn EventSink>,
    shutdown: watch::Receiver<bool>,
    monitors: RwLock<HashMap<String, MonitorSlot>>,
}

impl Engine {
    pub fn new(
        prober: Arc<dyn Prober>,
        sink: Arc<dyn EventSink>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            prober,
            sink,
            shutdown,
            monitors: RwLock::new(HashMap::new()),
        }
    }

    /// Validate and activate a monitor, replacing any running instance with
    /// the same id. The new instance always starts from a fresh state.
    pub async fn start_monitor(&self, config: &MonitorConfig) -> Result<(), InvalidMonitor> {
        let spec = validate_monitor(config)?;
        let id = spec.id().to_string();
        let schedule = spec.schedule.as_ref().map(|s| s.period);
        let monitor = Arc::new(Monitor::new(spec));

        let mut monitors = self.monitors.write().await;
        if let Some(old) = monitors.remove(&id) {
            drop(old.stop());
            tracing::debug!(monitor_id = %id, "Replaced running monitor");
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let dispatcher = events::spawn_dispatcher(self.sink.clone(), events_rx);
        let ctx = LoopContext {
            monitor: monitor.clone(),
            prober: self.prober.clone(),
            events: events_tx,
            stop: stop_rx,
            shutdown: self.shutdown.clone(),
        };

        let mut tasks = Vec::with_capacity(2);
        if let Some(period) = schedule {
            tasks.push(tokio::spawn(runner::run_schedule_loop(ctx.clone(), period)));
        }
        tasks.push(tokio::spawn(runner::run_check_loop(ctx)));

        let spec = monitor.spec();
        tracing::info!(
            monitor_id = %id,
            name = %spec.name(),
            check = spec.probe.kind(),
            target = %spec.probe.target(),
            primary = %spec.policy.primary_ip,
            backup = %spec.policy.backup_ip,
            scheduled = schedule.is_some(),
            "Monitor started"
        );
        metrics::record_monitor_down(&id, false);

        monitors.insert(
            id,
            MonitorSlot {
                monitor,
                stop_tx,
                tasks,
                dispatcher,
            },
        );
        metrics::record_active_monitors(monitors.len());
        Ok(())
    }

    /// Stop and remove a monitor. Returns false if the id is unknown.
    pub async fn stop_monitor(&self, id: &str) -> bool {
        let mut monitors = self.monitors.write().await;
        let Some(slot) = monitors.remove(id) else {
            return false;
        };
        drop(slot.stop());
        metrics::record_active_monitors(monitors.len());
        tracing::info!(monitor_id = %id, "Monitor stopped");
        true
    }

    /// Stop all monitors (for graceful shutdown), then give queued events
    /// up to `DRAIN_GRACE` to be delivered.
    pub async fn stop_all(&self) {
        let dispatchers: Vec<_> = {
            let mut monitors = self.monitors.write().await;
            monitors
                .drain()
                .map(|(id, slot)| {
                    tracing::debug!(monitor_id = %id, "Monitor stopped");
                    slot.stop()
                })
                .collect()
        };
        metrics::record_active_monitors(0);

        let aborts: Vec<_> = dispatchers.iter().map(JoinHandle::abort_handle).collect();
        if tokio::time::timeout(DRAIN_GRACE, join_all(dispatchers)).await.is_err() {
            tracing::warn!("Pending events not delivered before shutdown, dropping them");
            aborts.iter().for_each(|handle| handle.abort());
        }
        tracing::info!("All monitors stopped");
    }

    /// Administrative return to the primary. Returns the IP that was in
    /// effect before, or `None` for an unknown id. Emits no event.
    pub async fn force_restore(&self, id: &str) -> Option<String> {
        let monitor = self.monitor(id).await?;
        let previous = monitor.force_restore();
        metrics::record_monitor_down(id, false);
        tracing::info!(monitor_id = %id, previous_ip = %previous, "Monitor force-restored");
        Some(previous)
    }

    /// Snapshots of every monitor, sorted by name then id.
    pub async fn status(&self) -> Vec<MonitorStatusView> {
        let monitors = self.monitors.read().await;
        let mut views: Vec<_> = monitors.values().map(|slot| slot.monitor.view()).collect();
        views.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        views
    }

    /// Snapshot of a single monitor.
    pub async fn monitor_status(&self, id: &str) -> Option<MonitorStatusView> {
        self.monitor(id).await.map(|monitor| monitor.view())
    }

    pub async fn monitor(&self, id: &str) -> Option<Arc<Monitor>> {
        let monitors = self.monitors.read().await;
        monitors.get(id).map(|slot| slot.monitor.clone())
    }

    /// Ids with an active monitor.
    pub async fn active_monitors(&self) -> Vec<String> {
        let monitors = self.monitors.read().await;
        monitors.keys().cloned().collect()
    }

    pub async fn is_monitoring(&self, id: &str) -> bool {
        let monitors = self.monitors.read().await;
        monitors.contains_key(id)
    }
}
