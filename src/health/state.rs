//! Monitor health state machine.
//!
//! # States
//! - Normal: traffic nominally on the primary IP
//! - Down: failover active, traffic on the backup IP
//!
//! # State Transitions
//! ```text
//! Normal → Down:   consecutive failures  >= failure_threshold
//! Down   → Normal: consecutive successes >= success_threshold
//! ```
//!
//! # Design Decisions
//! - Hysteresis prevents flapping
//! - Counters are consecutive: every disqualifying signal resets them
//! - Counters reset on state transition
//! - Pure data, no I/O: the engine owns locking and event publication

use serde::{Deserialize, Serialize};

/// Monitor status. This is a property of the monitor, not of the primary
/// endpoint at this instant: it only flips on threshold crossings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorStatus {
    Normal,
    Down,
}

/// Which configured endpoint an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    Original,
    Backup,
}

impl EndpointRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointRole::Original => "original",
            EndpointRole::Backup => "backup",
        }
    }
}

impl std::fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoints and thresholds a monitor switches between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchPolicy {
    pub primary_ip: String,
    /// Empty when no backup is configured.
    pub backup_ip: String,
    pub failure_threshold: u32,
    pub success_threshold: u32,
}

/// Outcome of a primary probe that crossed a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Normal → Down. The primary is considered down.
    FailedOver,
    /// Down → Normal.
    Restored,
}

/// A timer-driven switch that took effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledSwitch {
    pub from_ip: String,
    pub to_ip: String,
}

/// Mutable health record of one monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorState {
    pub status: MonitorStatus,
    pub current_ip: String,
    pub fail_count: u32,
    pub succ_count: u32,
    pub backup_fail_count: u32,
    pub backup_down: bool,
}

impl MonitorState {
    /// Fresh state: `Normal` on the primary IP with all counters cleared.
    pub fn new(policy: &SwitchPolicy) -> Self {
        Self {
            status: MonitorStatus::Normal,
            current_ip: policy.primary_ip.clone(),
            fail_count: 0,
            succ_count: 0,
            backup_fail_count: 0,
            backup_down: false,
        }
    }

    /// Feed one primary probe result through the state machine.
    pub fn record_probe(&mut self, success: bool, policy: &SwitchPolicy) -> Option<Transition> {
        match (self.status, success) {
            (MonitorStatus::Normal, true) => {
                self.fail_count = 0;
                self.succ_count = 0;
                None
            }
            (MonitorStatus::Normal, false) => {
                self.fail_count += 1;
                if self.fail_count < policy.failure_threshold {
                    return None;
                }
                self.status = MonitorStatus::Down;
                self.current_ip = policy.backup_ip.clone();
                self.fail_count = 0;
                self.succ_count = 0;
                Some(Transition::FailedOver)
            }
            (MonitorStatus::Down, false) => {
                self.succ_count = 0;
                None
            }
            (MonitorStatus::Down, true) => {
                self.succ_count += 1;
                if self.succ_count < policy.success_threshold {
                    return None;
                }
                self.status = MonitorStatus::Normal;
                self.current_ip = policy.primary_ip.clone();
                self.succ_count = 0;
                self.fail_count = 0;
                self.clear_backup();
                Some(Transition::Restored)
            }
        }
    }

    /// Feed one backup probe result. Returns true when the backup endpoint
    /// has just been declared down; that happens once per down-episode.
    ///
    /// Ignored unless the monitor is `Down`.
    pub fn record_backup_probe(&mut self, success: bool, failure_threshold: u32) -> bool {
        if self.status != MonitorStatus::Down {
            return false;
        }
        if success {
            self.clear_backup();
            return false;
        }

        self.backup_fail_count += 1;
        if self.backup_fail_count >= failure_threshold && !self.backup_down {
            self.backup_down = true;
            self.backup_fail_count = 0;
            return true;
        }
        false
    }

    /// Apply a timer-driven switch.
    ///
    /// Suppressed while a failover is active. With no explicit target the
    /// switch toggles between primary and backup.
    pub fn scheduled_switch(
        &mut self,
        switch_ip: Option<&str>,
        policy: &SwitchPolicy,
    ) -> Option<ScheduledSwitch> {
        if self.status == MonitorStatus::Down {
            return None;
        }

        let to_ip = match switch_ip {
            Some(ip) if !ip.is_empty() => ip,
            _ if self.current_ip == policy.primary_ip => policy.backup_ip.as_str(),
            _ => policy.primary_ip.as_str(),
        };

        if to_ip.is_empty() || to_ip == self.current_ip {
            return None;
        }

        let from_ip = std::mem::replace(&mut self.current_ip, to_ip.to_string());
        self.fail_count = 0;
        self.succ_count = 0;

        Some(ScheduledSwitch {
            from_ip,
            to_ip: to_ip.to_string(),
        })
    }

    /// Administrative override back to the primary. Returns the IP that was
    /// in effect before the call.
    pub fn force_restore(&mut self, policy: &SwitchPolicy) -> String {
        let previous = std::mem::replace(&mut self.current_ip, policy.primary_ip.clone());
        self.status = MonitorStatus::Normal;
        self.fail_count = 0;
        self.succ_count = 0;
        self.clear_backup();
        previous
    }

    fn clear_backup(&mut self) {
        self.backup_fail_count = 0;
        self.backup_down = false;
    }
}
