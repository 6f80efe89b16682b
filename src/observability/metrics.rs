//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define failover metrics (probes, switches, outages, side effects)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `failover_probes_total` (counter): probes by monitor, result
//! - `failover_switches_total` (counter): switches by reason
//! - `failover_ip_down_total` (counter): endpoint-down events by role
//! - `failover_monitor_down` (gauge): 1 while a monitor is failed over
//! - `failover_active_monitors` (gauge): registered monitors
//! - `failover_dns_updates_total` (counter): record updates by result
//! - `failover_notifications_total` (counter): deliveries by channel, result
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are bounded: monitor ids, fixed reason/role/channel names

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "success"
    } else {
        "failure"
    }
}

pub fn record_probe(monitor: &str, ok: bool) {
    counter!("failover_probes_total", "monitor" => monitor.to_string(), "result" => outcome(ok))
        .increment(1);
}

/// `reason` is one of `failover`, `restore`, `schedule`, `manual`.
pub fn record_switch(reason: &'static str) {
    counter!("failover_switches_total", "reason" => reason).increment(1);
}

pub fn record_ip_down(role: &'static str) {
    counter!("failover_ip_down_total", "role" => role).increment(1);
}

pub fn record_monitor_down(monitor: &str, down: bool) {
    gauge!("failover_monitor_down", "monitor" => monitor.to_string())
        .set(if down { 1.0 } else { 0.0 });
}

pub fn record_active_monitors(count: usize) {
    gauge!("failover_active_monitors").set(count as f64);
}

pub fn record_dns_update(ok: bool) {
    counter!("failover_dns_updates_total", "result" => outcome(ok)).increment(1);
}

pub fn record_notification(channel: &'static str, ok: bool) {
    counter!("failover_notifications_total", "channel" => channel, "result" => outcome(ok))
        .increment(1);
}
