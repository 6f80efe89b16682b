//! Active health probes.
//!
//! # Responsibilities
//! - Perform exactly one health check per call
//! - Reduce the outcome to success/failure
//!
//! # Design Decisions
//! - Check kind is resolved at validation time into a `ProbeSpec`
//! - Timeouts, connection errors and setup errors are all plain failures
//! - Ping success means packet loss below `PING_LOSS_THRESHOLD` percent
//! - The whole echo burst shares one timeout budget; echoes not answered
//!   or never sent within it count as lost

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use rand::random;
use surge_ping::{
    Client as PingClient, Config as PingConfig, PingIdentifier, PingSequence, Pinger, ICMP,
};
use tokio::net::TcpStream;
use tokio::time;

/// Packet loss percentage at or above which a ping probe fails.
pub const PING_LOSS_THRESHOLD: f64 = 60.0;

const PING_PAYLOAD: [u8; 56] = [0; 56];
const PING_SPACING: Duration = Duration::from_millis(200);

/// A validated, ready-to-run health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeSpec {
    /// ICMP echo burst; `target` is an IP or hostname.
    Ping {
        target: String,
        count: u32,
        timeout: Duration,
    },
    /// HTTP(S) GET; 2xx and 3xx are healthy.
    Http { url: String, timeout: Duration },
    /// Bare TCP connect to `host:port`.
    Tcp { addr: String, timeout: Duration },
}

impl ProbeSpec {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeSpec::Ping { .. } => "ping",
            ProbeSpec::Http { .. } => "http",
            ProbeSpec::Tcp { .. } => "tcp",
        }
    }

    pub fn target(&self) -> &str {
        match self {
            ProbeSpec::Ping { target, .. } => target,
            ProbeSpec::Http { url, .. } => url,
            ProbeSpec::Tcp { addr, .. } => addr,
        }
    }
}

/// Executes health probes.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Run one probe. Never errors: anything other than a healthy answer is `false`.
    async fn probe(&self, spec: &ProbeSpec) -> bool;
}

/// Prober backed by real sockets.
pub struct NetworkProber {
    http: reqwest::Client,
    ping_v4: Option<PingClient>,
    ping_v6: Option<PingClient>,
}

impl NetworkProber {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("dns-failover/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build tuned HTTP client, using defaults");
                reqwest::Client::new()
            });

        let ping_v4 = match PingClient::new(&PingConfig::default()) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "ICMPv4 socket unavailable, ping probes will fail");
                None
            }
        };
        let ping_v6 = PingClient::new(&PingConfig::builder().kind(ICMP::V6).build()).ok();

        Self {
            http,
            ping_v4,
            ping_v6,
        }
    }

    async fn ping(&self, target: &str, count: u32, timeout: Duration) -> bool {
        let ip = match resolve(target).await {
            Some(ip) => ip,
            None => {
                tracing::warn!(target = %target, "Ping target could not be resolved");
                return false;
            }
        };

        let client = match ip {
            IpAddr::V4(_) => self.ping_v4.as_ref(),
            IpAddr::V6(_) => self.ping_v6.as_ref(),
        };
        let Some(client) = client else {
            tracing::warn!(target = %target, "No ICMP socket for address family");
            return false;
        };

        let count = count.max(1);
        let mut pinger = client.pinger(ip, PingIdentifier(random())).await;
        pinger.timeout(timeout);

        let received = echo_burst(&mut pinger, count, timeout).await;
        let loss = packet_loss(count, received);
        tracing::debug!(target = %target, sent = count, received, loss, "Ping finished");
        loss < PING_LOSS_THRESHOLD
    }

    async fn http_get(&self, url: &str, timeout: Duration) -> bool {
        match self.http.get(url).timeout(timeout).send().await {
            Ok(response) => {
                let status = response.status();
                let healthy = status.is_success() || status.is_redirection();
                if !healthy {
                    tracing::warn!(url = %url, status = %status, "HTTP check failed: unhealthy status");
                }
                healthy
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!(url = %url, "HTTP check failed: timeout");
                false
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "HTTP check failed: request error");
                false
            }
        }
    }

    async fn tcp_connect(&self, addr: &str, timeout: Duration) -> bool {
        match time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::warn!(addr = %addr, error = %e, "TCP check failed: connection error");
                false
            }
            Err(_) => {
                tracing::warn!(addr = %addr, "TCP check failed: timeout");
                false
            }
        }
    }
}

impl Default for NetworkProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prober for NetworkProber {
    async fn probe(&self, spec: &ProbeSpec) -> bool {
        match spec {
            ProbeSpec::Ping {
                target,
                count,
                timeout,
            } => self.ping(target, *count, *timeout).await,
            ProbeSpec::Http { url, timeout } => self.http_get(url, *timeout).await,
            ProbeSpec::Tcp { addr, timeout } => self.tcp_connect(addr, *timeout).await,
        }
    }
}

/// One ICMP echo round trip.
#[async_trait]
trait Echo: Send {
    async fn echo(&mut self, seq: u16) -> bool;
}

#[async_trait]
impl Echo for Pinger {
    async fn echo(&mut self, seq: u16) -> bool {
        self.ping(PingSequence(seq), &PING_PAYLOAD).await.is_ok()
    }
}

/// Send up to `count` echoes within `budget`; returns the replies received.
///
/// Spacing shrinks when `count` echoes would not fit the budget at the
/// default pace.
async fn echo_burst(echo: &mut dyn Echo, count: u32, budget: Duration) -> u32 {
    let spacing = PING_SPACING.min(budget / count.max(1));
    let mut received = 0u32;

    let burst = async {
        for seq in 0..count {
            if echo.echo(seq as u16).await {
                received += 1;
            }
            if seq + 1 < count {
                time::sleep(spacing).await;
            }
        }
    };
    if time::timeout(budget, burst).await.is_err() {
        tracing::debug!(sent = count, received, "Ping budget exhausted");
    }
    received
}

/// Packet loss in percent.
pub fn packet_loss(sent: u32, received: u32) -> f64 {
    if sent == 0 {
        return 100.0;
    }
    let lost = sent.saturating_sub(received);
    f64::from(lost) * 100.0 / f64::from(sent)
}

async fn resolve(target: &str) -> Option<IpAddr> {
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Some(ip);
    }
    tokio::net::lookup_host((target, 0))
        .await
        .ok()?
        .next()
        .map(|addr| addr.ip())
}
