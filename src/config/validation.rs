//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Resolve each monitor's check type into a concrete `ProbeSpec`
//! - Apply defaults for unset timing and threshold fields
//! - Detect duplicate monitor ids
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Unknown check types are rejected here, never at probe time
//! - Runs before a monitor is activated

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::schema::{AppConfig, MonitorConfig};
use crate::engine::spec::{BackupWatch, MonitorSpec, ScheduleSpec};
use crate::health::{ProbeSpec, SwitchPolicy};

pub const DEFAULT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 2;
pub const DEFAULT_PING_COUNT: u32 = 5;
/// Upper bound on echo requests per ping probe.
pub const MAX_PING_COUNT: u32 = 100;
pub const DEFAULT_PING_TIMEOUT_SECS: u64 = 2;
pub const DEFAULT_TCP_TIMEOUT_SECS: u64 = 2;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Missing { field: &'static str },

    #[error("{field} is not a valid IP address: {value}")]
    InvalidIp { field: &'static str, value: String },

    #[error("unknown check type: {0}")]
    UnknownCheckType(String),

    #[error("invalid check target URL {target}: {reason}")]
    InvalidUrl { target: String, reason: String },

    #[error("tcp check target must be host:port, got {0}")]
    MissingPort(String),

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("ping_count must be at most {max}, got {value}")]
    PingCountTooLarge { value: u32, max: u32 },

    #[error("duplicate monitor id: {0}")]
    DuplicateMonitorId(String),

    #[error("monitor {id}: {error}")]
    Monitor {
        id: String,
        error: Box<ValidationError>,
    },
}

/// A monitor definition that cannot be activated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid monitor {id}: {}", join_errors(.errors))]
pub struct InvalidMonitor {
    pub id: String,
    pub errors: Vec<ValidationError>,
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Closed set of check kinds accepted in `check_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckKind {
    Ping,
    Http { tls: bool },
    Tcp,
}

impl CheckKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "ping" | "icmp" => Some(CheckKind::Ping),
            "http" => Some(CheckKind::Http { tls: false }),
            "https" => Some(CheckKind::Http { tls: true }),
            "tcp" | "tcping" => Some(CheckKind::Tcp),
            _ => None,
        }
    }
}

/// Validate the whole file: listener addresses, every monitor, unique ids.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let mut seen = HashSet::new();
    for monitor in &config.monitors {
        if !monitor.id.is_empty() && !seen.insert(monitor.id.as_str()) {
            errors.push(ValidationError::DuplicateMonitorId(monitor.id.clone()));
        }
        if let Err(invalid) = validate_monitor(monitor) {
            errors.extend(invalid.errors.into_iter().map(|error| ValidationError::Monitor {
                id: invalid.id.clone(),
                error: Box::new(error),
            }));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Turn a raw monitor definition into its activation form.
pub fn validate_monitor(config: &MonitorConfig) -> Result<MonitorSpec, InvalidMonitor> {
    let mut errors = Vec::new();

    if config.id.trim().is_empty() {
        errors.push(ValidationError::Missing { field: "id" });
    }

    check_ip(&mut errors, "original_ip", &config.original_ip, true);
    check_ip(&mut errors, "backup_ip", &config.backup_ip, false);
    if config.schedule_enabled {
        check_ip(&mut errors, "schedule_switch_ip", &config.schedule_switch_ip, false);
    }

    let probe = match CheckKind::parse(&config.check_type) {
        Some(kind) => build_probe(kind, config).map_err(|e| errors.push(e)).ok(),
        None => {
            errors.push(ValidationError::UnknownCheckType(config.check_type.clone()));
            None
        }
    };

    let probe = match probe {
        Some(probe) if errors.is_empty() => probe,
        _ => {
            return Err(InvalidMonitor {
                id: config.id.clone(),
                errors,
            })
        }
    };

    let failure_threshold = or_default(config.failure_threshold, DEFAULT_FAILURE_THRESHOLD);
    let policy = SwitchPolicy {
        primary_ip: config.original_ip.trim().to_string(),
        backup_ip: config.backup_ip.trim().to_string(),
        failure_threshold,
        success_threshold: or_default(config.success_threshold, DEFAULT_SUCCESS_THRESHOLD),
    };

    let backup_watch = match &probe {
        ProbeSpec::Ping { count, timeout, .. } if !policy.backup_ip.is_empty() => Some(BackupWatch {
            probe: ProbeSpec::Ping {
                target: policy.backup_ip.clone(),
                count: *count,
                timeout: *timeout,
            },
            failure_threshold,
        }),
        _ => None,
    };

    let schedule = (config.schedule_enabled && config.schedule_hours > 0).then(|| ScheduleSpec {
        period: Duration::from_secs(config.schedule_hours.saturating_mul(3600)),
        switch_ip: Some(config.schedule_switch_ip.trim())
            .filter(|ip| !ip.is_empty())
            .map(str::to_string),
    });

    Ok(MonitorSpec {
        config: Arc::new(config.clone()),
        policy,
        interval: Duration::from_secs(or_default(config.interval, DEFAULT_INTERVAL_SECS)),
        probe,
        backup_watch,
        schedule,
    })
}

fn build_probe(kind: CheckKind, config: &MonitorConfig) -> Result<ProbeSpec, ValidationError> {
    let target = config.check_target.trim();

    match kind {
        CheckKind::Ping => {
            let target = if target.is_empty() {
                config.original_ip.trim()
            } else {
                target
            };
            if config.ping_count > MAX_PING_COUNT {
                return Err(ValidationError::PingCountTooLarge {
                    value: config.ping_count,
                    max: MAX_PING_COUNT,
                });
            }
            Ok(ProbeSpec::Ping {
                target: target.to_string(),
                count: or_default(config.ping_count, DEFAULT_PING_COUNT),
                timeout: timeout_or(config.timeout_seconds, DEFAULT_PING_TIMEOUT_SECS),
            })
        }
        CheckKind::Http { tls } => {
            if target.is_empty() {
                return Err(ValidationError::Missing { field: "check_target" });
            }
            let raw = if target.contains("://") {
                target.to_string()
            } else {
                format!("{}://{}", if tls { "https" } else { "http" }, target)
            };
            let url = Url::parse(&raw).map_err(|e| ValidationError::InvalidUrl {
                target: target.to_string(),
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ValidationError::InvalidUrl {
                    target: target.to_string(),
                    reason: format!("unsupported scheme {}", url.scheme()),
                });
            }
            Ok(ProbeSpec::Http {
                url: url.to_string(),
                timeout: timeout_or(config.timeout_seconds, DEFAULT_HTTP_TIMEOUT_SECS),
            })
        }
        CheckKind::Tcp => {
            if target.is_empty() {
                return Err(ValidationError::Missing { field: "check_target" });
            }
            let has_port = target
                .rsplit_once(':')
                .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
            if !has_port {
                return Err(ValidationError::MissingPort(target.to_string()));
            }
            Ok(ProbeSpec::Tcp {
                addr: target.to_string(),
                timeout: timeout_or(config.timeout_seconds, DEFAULT_TCP_TIMEOUT_SECS),
            })
        }
    }
}

fn check_ip(errors: &mut Vec<ValidationError>, field: &'static str, value: &str, required: bool) {
    let value = value.trim();
    if value.is_empty() {
        if required {
            errors.push(ValidationError::Missing { field });
        }
        return;
    }
    if value.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidIp {
            field,
            value: value.to_string(),
        });
    }
}

fn or_default<T: Default + PartialEq>(value: T, default: T) -> T {
    if value == T::default() {
        default
    } else {
        value
    }
}

fn timeout_or(secs: u64, default_secs: u64) -> Duration {
    Duration::from_secs(or_default(secs, default_secs))
}
