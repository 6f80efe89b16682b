//! Per-monitor background loops.
//!
//! # Responsibilities
//! - Check loop: probe the primary every interval, feed the state machine,
//!   then run the backup watchdog
//! - Schedule loop: apply timer-driven switches
//!
//! # Design Decisions
//! - First tick fires one period after activation
//! - Missed ticks are delayed, never bursted
//! - Loops stop on their own stop signal or the process-wide shutdown

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::engine::events::MonitorEvent;
use crate::engine::monitor::{BackupSignal, Monitor};
use crate::engine::spec::BackupWatch;
use crate::health::{EndpointRole, Prober, Transition};
use crate::lifecycle::shutdown;
use crate::observability::metrics;

/// Everything a loop needs; each spawned task owns its own copy.
#[derive(Clone)]
pub(crate) struct LoopContext {
    pub monitor: Arc<Monitor>,
    pub prober: Arc<dyn Prober>,
    pub events: mpsc::UnboundedSender<MonitorEvent>,
    pub stop: watch::Receiver<bool>,
    pub shutdown: watch::Receiver<bool>,
}

impl LoopContext {
    fn emit(&self, event: MonitorEvent) {
        if self.events.send(event).is_err() {
            tracing::warn!(monitor_id = %self.monitor.spec().id(), "Event dispatcher gone, dropping event");
        }
    }

    /// Resolves when this loop should exit.
    async fn cancelled(&mut self) {
        let (stop, root) = (&mut self.stop, &mut self.shutdown);
        tokio::select! {
            _ = shutdown::wait_for(stop) => {}
            _ = shutdown::wait_for(root) => {}
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

pub(crate) async fn run_check_loop(mut ctx: LoopContext) {
    let spec = ctx.monitor.spec().clone();
    let mut ticker = ticker(spec.interval);

    tracing::debug!(
        monitor_id = %spec.id(),
        check = spec.probe.kind(),
        target = %spec.probe.target(),
        interval_secs = spec.interval.as_secs(),
        "Check loop starting"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => check_once(&ctx).await,
            _ = ctx.cancelled() => break,
        }
    }

    tracing::debug!(monitor_id = %spec.id(), "Check loop stopped");
}

async fn check_once(ctx: &LoopContext) {
    let spec = ctx.monitor.spec();
    let success = ctx.prober.probe(&spec.probe).await;
    metrics::record_probe(spec.id(), success);

    match ctx.monitor.record_probe(success) {
        Some(Transition::FailedOver) => {
            tracing::warn!(
                monitor_id = %spec.id(),
                name = %spec.name(),
                primary = %spec.policy.primary_ip,
                backup = %spec.policy.backup_ip,
                "Primary down, failing over to backup"
            );
            metrics::record_ip_down(EndpointRole::Original.as_str());
            metrics::record_switch("failover");
            metrics::record_monitor_down(spec.id(), true);
            ctx.emit(MonitorEvent::IpDown {
                monitor: spec.config.clone(),
                ip: spec.policy.primary_ip.clone(),
                role: EndpointRole::Original,
            });
            ctx.emit(MonitorEvent::Switched {
                monitor: spec.config.clone(),
                to_backup: true,
            });
        }
        Some(Transition::Restored) => {
            tracing::info!(
                monitor_id = %spec.id(),
                name = %spec.name(),
                primary = %spec.policy.primary_ip,
                "Primary healthy again, restoring"
            );
            metrics::record_switch("restore");
            metrics::record_monitor_down(spec.id(), false);
            ctx.emit(MonitorEvent::Switched {
                monitor: spec.config.clone(),
                to_backup: false,
            });
        }
        None => {
            tracing::debug!(monitor_id = %spec.id(), success, "Probe recorded");
        }
    }

    if let Some(watch) = &spec.backup_watch {
        if ctx.monitor.is_down() {
            check_backup(ctx, watch).await;
        }
    }
}

async fn check_backup(ctx: &LoopContext, watch: &BackupWatch) {
    let spec = ctx.monitor.spec();
    let success = ctx.prober.probe(&watch.probe).await;

    // Re-checked under the lock: a restore during the probe discards the result.
    match ctx.monitor.record_backup_probe(success, watch.failure_threshold) {
        BackupSignal::Alert => {
            tracing::error!(
                monitor_id = %spec.id(),
                name = %spec.name(),
                backup = %spec.policy.backup_ip,
                "Backup endpoint down while failed over"
            );
            metrics::record_ip_down(EndpointRole::Backup.as_str());
            ctx.emit(MonitorEvent::IpDown {
                monitor: spec.config.clone(),
                ip: spec.policy.backup_ip.clone(),
                role: EndpointRole::Backup,
            });
        }
        BackupSignal::Recovered => {
            tracing::info!(
                monitor_id = %spec.id(),
                backup = %spec.policy.backup_ip,
                "Backup endpoint recovered"
            );
        }
        BackupSignal::Unchanged => {}
    }
}

pub(crate) async fn run_schedule_loop(mut ctx: LoopContext, period: Duration) {
    let id = ctx.monitor.spec().id().to_string();
    let mut ticker = ticker(period);

    tracing::debug!(monitor_id = %id, period_secs = period.as_secs(), "Schedule loop starting");

    loop {
        tokio::select! {
            _ = ticker.tick() => scheduled_once(&ctx),
            _ = ctx.cancelled() => break,
        }
    }

    tracing::debug!(monitor_id = %id, "Schedule loop stopped");
}

fn scheduled_once(ctx: &LoopContext) {
    let spec = ctx.monitor.spec();
    match ctx.monitor.scheduled_switch() {
        Some(switch) => {
            tracing::info!(
                monitor_id = %spec.id(),
                from = %switch.from_ip,
                to = %switch.to_ip,
                "Scheduled switch"
            );
            metrics::record_switch("schedule");
            ctx.emit(MonitorEvent::ScheduledSwitch {
                monitor: spec.config.clone(),
                from_ip: switch.from_ip,
                to_ip: switch.to_ip,
            });
        }
        None => {
            tracing::debug!(monitor_id = %spec.id(), "Scheduled switch skipped");
        }
    }
}
