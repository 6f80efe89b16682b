//! One registered monitor: its immutable spec plus lock-guarded state.
//!
//! The state lock is a `std::sync::RwLock` held only for the duration of a
//! state-machine call, never across an `.await`.

use std::sync::RwLock;

use serde::Serialize;

use crate::engine::spec::MonitorSpec;
use crate::health::state::ScheduledSwitch;
use crate::health::{MonitorState, MonitorStatus, Transition};

/// Outcome of a backup probe as seen by the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BackupSignal {
    /// Backup just crossed its failure threshold.
    Alert,
    /// Backup answered again after an alert.
    Recovered,
    Unchanged,
}

/// Point-in-time view of a monitor, taken under its lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorStatusView {
    pub id: String,
    pub name: String,
    pub status: MonitorStatus,
    pub current_ip: String,
    pub original_ip: String,
    pub backup_ip: String,
    pub fail_count: u32,
    pub succ_count: u32,
    pub backup_fail_count: u32,
    pub backup_down: bool,
    pub check_type: &'static str,
}

pub struct Monitor {
    spec: MonitorSpec,
    state: RwLock<MonitorState>,
}

impl Monitor {
    pub fn new(spec: MonitorSpec) -> Self {
        let state = MonitorState::new(&spec.policy);
        Self {
            spec,
            state: RwLock::new(state),
        }
    }

    pub fn spec(&self) -> &MonitorSpec {
        &self.spec
    }

    pub fn snapshot(&self) -> MonitorState {
        self.state.read().expect("monitor state lock poisoned").clone()
    }

    pub fn is_down(&self) -> bool {
        self.state.read().expect("monitor state lock poisoned").status == MonitorStatus::Down
    }

    pub fn view(&self) -> MonitorStatusView {
        let state = self.snapshot();
        MonitorStatusView {
            id: self.spec.id().to_string(),
            name: self.spec.name().to_string(),
            status: state.status,
            current_ip: state.current_ip,
            original_ip: self.spec.policy.primary_ip.clone(),
            backup_ip: self.spec.policy.backup_ip.clone(),
            fail_count: state.fail_count,
            succ_count: state.succ_count,
            backup_fail_count: state.backup_fail_count,
            backup_down: state.backup_down,
            check_type: self.spec.probe.kind(),
        }
    }

    pub(crate) fn record_probe(&self, success: bool) -> Option<Transition> {
        let mut state = self.state.write().expect("monitor state lock poisoned");
        state.record_probe(success, &self.spec.policy)
    }

    pub(crate) fn record_backup_probe(&self, success: bool, failure_threshold: u32) -> BackupSignal {
        let mut state = self.state.write().expect("monitor state lock poisoned");
        let was_down = state.backup_down;
        if state.record_backup_probe(success, failure_threshold) {
            BackupSignal::Alert
        } else if was_down && !state.backup_down && state.status == MonitorStatus::Down {
            BackupSignal::Recovered
        } else {
            BackupSignal::Unchanged
        }
    }

    pub(crate) fn scheduled_switch(&self) -> Option<ScheduledSwitch> {
        let schedule = self.spec.schedule.as_ref()?;
        let mut state = self.state.write().expect("monitor state lock poisoned");
        state.scheduled_switch(schedule.switch_ip.as_deref(), &self.spec.policy)
    }

    /// Back to Normal on the primary; returns the IP in effect before.
    pub fn force_restore(&self) -> String {
        let mut state = self.state.write().expect("monitor state lock poisoned");
        state.force_restore(&self.spec.policy)
    }
}
