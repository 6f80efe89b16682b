use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::types::*;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {}", body.error)]
    Api { status: StatusCode, body: ApiErrorBody },
}

impl SdkError {
    /// HTTP status for API errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SdkError::Api { status, .. } => Some(*status),
            SdkError::Http(e) => e.status(),
        }
    }
}

pub struct AdminClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AdminClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Send `Authorization: Bearer <key>` on every API call.
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub async fn healthz(&self) -> Result<bool, SdkError> {
        let resp = self.client.get(self.url("/healthz")).send().await?;
        Ok(resp.status().is_success())
    }

    pub async fn status(&self) -> Result<StatusReport, SdkError> {
        self.json(self.get("/api/status")).await
    }

    pub async fn list_monitors(&self) -> Result<Vec<MonitorDefinition>, SdkError> {
        self.json(self.get("/api/monitors")).await
    }

    /// Create and start a monitor. The server assigns an id when empty.
    pub async fn create_monitor(
        &self,
        monitor: &MonitorDefinition,
    ) -> Result<MonitorDefinition, SdkError> {
        let req = self.authed(self.client.post(self.url("/api/monitors"))).json(monitor);
        self.json(req).await
    }

    pub async fn update_monitor(
        &self,
        id: &str,
        monitor: &MonitorDefinition,
    ) -> Result<MonitorDefinition, SdkError> {
        let req = self
            .authed(self.client.put(self.url(&format!("/api/monitors/{id}"))))
            .json(monitor);
        self.json(req).await
    }

    pub async fn delete_monitor(&self, id: &str) -> Result<(), SdkError> {
        let req = self.authed(self.client.delete(self.url(&format!("/api/monitors/{id}"))));
        check(req.send().await?).await?;
        Ok(())
    }

    /// Force a monitor back to its primary IP.
    pub async fn restore(&self, id: &str, proxied: Option<bool>) -> Result<SwitchRecord, SdkError> {
        let req = self
            .authed(self.client.post(self.url(&format!("/api/monitors/{id}/restore"))))
            .json(&json!({ "proxied": proxied }));
        self.json(req).await
    }

    pub async fn history(&self, limit: usize) -> Result<Vec<SwitchRecord>, SdkError> {
        self.json(self.get("/api/history").query(&[("limit", limit)])).await
    }

    pub async fn ip_down(&self, limit: usize) -> Result<Vec<IpDownRecord>, SdkError> {
        self.json(self.get("/api/ip-down").query(&[("limit", limit)])).await
    }

    /// Verify a login token; stores it when the server has none yet.
    pub async fn login(&self, token: &str) -> Result<LoginResult, SdkError> {
        let req = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "token": token }));
        self.json(req).await
    }

    pub async fn auth_status(&self) -> Result<AuthStatus, SdkError> {
        self.json(self.client.get(self.url("/api/auth/status"))).await
    }

    pub async fn list_zones(&self) -> Result<Vec<Zone>, SdkError> {
        self.json(self.get("/api/zones")).await
    }

    /// Records in a zone; `search` filters on name, content or type.
    pub async fn list_records(
        &self,
        zone_id: &str,
        search: Option<&str>,
    ) -> Result<Vec<DnsRecord>, SdkError> {
        let mut req = self.get(&format!("/api/zones/{zone_id}/records"));
        if let Some(search) = search {
            req = req.query(&[("search", search)]);
        }
        self.json(req).await
    }

    pub async fn create_record(
        &self,
        zone_id: &str,
        record: &RecordInput,
    ) -> Result<DnsRecord, SdkError> {
        let req = self
            .authed(self.client.post(self.url(&format!("/api/zones/{zone_id}/records"))))
            .json(record);
        self.json(req).await
    }

    pub async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &RecordInput,
    ) -> Result<DnsRecord, SdkError> {
        let path = format!("/api/zones/{zone_id}/records/{record_id}");
        let req = self.authed(self.client.put(self.url(&path))).json(record);
        self.json(req).await
    }

    pub async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), SdkError> {
        let path = format!("/api/zones/{zone_id}/records/{record_id}");
        check(self.authed(self.client.delete(self.url(&path))).send().await?).await?;
        Ok(())
    }

    pub async fn bulk_update_records(
        &self,
        zone_id: &str,
        updates: &[BulkUpdate],
    ) -> Result<Vec<BulkResult>, SdkError> {
        let path = format!("/api/zones/{zone_id}/records/bulk");
        let req = self.authed(self.client.post(self.url(&path))).json(updates);
        self.json(req).await
    }

    pub async fn get_config(&self) -> Result<Settings, SdkError> {
        self.json(self.get("/api/config")).await
    }

    pub async fn update_config(&self, settings: &Settings) -> Result<Settings, SdkError> {
        let req = self.authed(self.client.post(self.url("/api/config"))).json(settings);
        self.json(req).await
    }

    pub async fn list_accounts(&self) -> Result<AccountList, SdkError> {
        self.json(self.get("/api/cloudflare-accounts")).await
    }

    /// Add an account. The server assigns an id when empty.
    pub async fn create_account(
        &self,
        account: &CloudflareAccount,
    ) -> Result<CloudflareAccount, SdkError> {
        let req = self
            .authed(self.client.post(self.url("/api/cloudflare-accounts")))
            .json(account);
        self.json(req).await
    }

    pub async fn update_account(
        &self,
        id: &str,
        account: &CloudflareAccount,
    ) -> Result<CloudflareAccount, SdkError> {
        let path = format!("/api/cloudflare-accounts/{id}");
        let req = self.authed(self.client.put(self.url(&path))).json(account);
        self.json(req).await
    }

    pub async fn delete_account(&self, id: &str) -> Result<(), SdkError> {
        let path = format!("/api/cloudflare-accounts/{id}");
        check(self.authed(self.client.delete(self.url(&path))).send().await?).await?;
        Ok(())
    }

    pub async fn activate_account(&self, id: &str) -> Result<AccountList, SdkError> {
        let path = format!("/api/cloudflare-accounts/{id}/activate");
        self.json(self.authed(self.client.post(self.url(&path)))).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authed(self.client.get(self.url(path)))
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, SdkError> {
        let resp = check(req.send().await?).await?;
        Ok(resp.json().await?)
    }
}

async fn check(resp: Response) -> Result<Response, SdkError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let body = serde_json::from_str(&text).unwrap_or_else(|_| ApiErrorBody {
        error: text,
        details: Vec::new(),
    });
    Err(SdkError::Api { status, body })
}
