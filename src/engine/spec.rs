//! Validated, immutable monitor definition.
//!
//! Built once per activation by `config::validation::validate_monitor`; the
//! loops only ever see this form, never the raw `MonitorConfig`.

use std::sync::Arc;
use std::time::Duration;

use crate::config::MonitorConfig;
use crate::health::{ProbeSpec, SwitchPolicy};

/// Everything a monitor's loops need.
#[derive(Debug, Clone)]
pub struct MonitorSpec {
    /// The raw definition, handed to event sinks.
    pub config: Arc<MonitorConfig>,
    pub policy: SwitchPolicy,
    pub interval: Duration,
    pub probe: ProbeSpec,
    pub backup_watch: Option<BackupWatch>,
    pub schedule: Option<ScheduleSpec>,
}

impl MonitorSpec {
    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }
}

/// Secondary ping watch on the backup endpoint while failed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupWatch {
    pub probe: ProbeSpec,
    pub failure_threshold: u32,
}

/// Timer-driven switching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSpec {
    pub period: Duration,
    /// Explicit target; `None` toggles between primary and backup.
    pub switch_ip: Option<String>,
}
