//! Cloudflare v4 REST client.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::records::{DnsRecord, RecordInput};
use super::{DnsError, DnsProvider};
use crate::config::{CloudflareConfig, IntegrationsConfig};
use crate::store::Store;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    pub(super) result: Option<T>,
    #[serde(default)]
    pub(super) result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Paging metadata on list responses.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ResultInfo {
    pub(super) page: u32,
    pub(super) total_pages: u32,
}

/// DNS provider backed by the Cloudflare API.
pub struct CloudflareDns {
    pub(super) http: reqwest::Client,
    config: Arc<ArcSwap<IntegrationsConfig>>,
    accounts: Option<Arc<Store>>,
}

impl CloudflareDns {
    /// Credentials come from the shared config only.
    pub fn new(config: Arc<ArcSwap<IntegrationsConfig>>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build tuned HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self {
            http,
            config,
            accounts: None,
        }
    }

    /// Credentials come from the store's active account when one is set,
    /// falling back to the shared config.
    pub fn with_accounts(config: Arc<ArcSwap<IntegrationsConfig>>, store: Arc<Store>) -> Self {
        Self {
            accounts: Some(store),
            ..Self::new(config)
        }
    }

    /// Effective credentials for one call. `api_base` always comes from config.
    pub(super) fn credentials(&self) -> CloudflareConfig {
        let mut creds = self.config.load().cloudflare.clone();
        if let Some(account) = self.accounts.as_ref().and_then(|s| s.active_account()) {
            creds.api_token = account.api_token;
            creds.api_key = account.api_key;
            creds.email = account.email;
        }
        creds
    }

    pub(super) fn authorize(
        request: RequestBuilder,
        creds: &CloudflareConfig,
    ) -> Result<RequestBuilder, DnsError> {
        if !creds.api_token.is_empty() {
            Ok(request.bearer_auth(&creds.api_token))
        } else if !creds.api_key.is_empty() && !creds.email.is_empty() {
            Ok(request
                .header("X-Auth-Key", &creds.api_key)
                .header("X-Auth-Email", &creds.email))
        } else {
            Err(DnsError::MissingCredentials)
        }
    }

    /// Send and unwrap the response envelope.
    pub(super) async fn send<T: DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<Envelope<T>, DnsError> {
        let response = request.send().await?;
        let status = response.status();
        let body: Envelope<T> = response.json().await?;

        if !status.is_success() || !body.success {
            let detail = body
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            if status == StatusCode::NOT_FOUND {
                return Err(DnsError::NotFound(detail));
            }
            return Err(DnsError::Api(format!("{status}: {detail}")));
        }
        Ok(body)
    }

    pub(super) async fn call<T: DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<Option<T>, DnsError> {
        Ok(Self::send(request).await?.result)
    }
}

/// Record type for the given content.
pub fn record_type(ip: &str) -> &'static str {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => "AAAA",
        _ => "A",
    }
}

#[async_trait]
impl DnsProvider for CloudflareDns {
    async fn update_record(
        &self,
        zone_id: &str,
        name: &str,
        ip: &str,
        proxied: bool,
    ) -> Result<(), DnsError> {
        let creds = self.credentials();
        let base = creds.api_base.trim_end_matches('/');
        let records_url = format!("{base}/zones/{zone_id}/dns_records");

        let lookup = Self::authorize(self.http.get(&records_url).query(&[("name", name)]), &creds)?;
        let records: Vec<DnsRecord> = Self::call(lookup).await?.unwrap_or_default();
        let record = records
            .into_iter()
            .next()
            .ok_or_else(|| DnsError::RecordNotFound(name.to_string()))?;

        let update = RecordInput {
            record_type: record_type(ip).to_string(),
            name: name.to_string(),
            content: ip.to_string(),
            proxied,
            ttl: 1,
        };
        let put = Self::authorize(
            self.http.put(format!("{records_url}/{}", record.id)).json(&update),
            &creds,
        )?;
        Self::call::<serde_json::Value>(put).await?;

        tracing::info!(zone_id = %zone_id, record = %name, ip = %ip, proxied, "DNS record updated");
        Ok(())
    }
}
