//! Zone and record management on top of the Cloudflare client.
//!
//! Every call resolves credentials afresh, like the failover path.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::cloudflare::CloudflareDns;
use super::DnsError;

/// Page size requested from list endpoints.
const PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type", default)]
    pub record_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default)]
    pub ttl: u32,
}

/// Body of a record create or full update. `ttl == 1` means automatic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInput {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    #[serde(default = "auto_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
}

fn auto_ttl() -> u32 {
    1
}

/// One entry of a bulk update. Unset fields keep the record's value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkUpdate {
    pub record_id: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    pub record_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Case-insensitive substring match on name, content or type.
pub fn matches_query(record: &DnsRecord, query: &str) -> bool {
    let query = query.to_lowercase();
    [&record.name, &record.content, &record.record_type]
        .iter()
        .any(|field| field.to_lowercase().contains(&query))
}

impl CloudflareDns {
    pub async fn list_zones(&self) -> Result<Vec<Zone>, DnsError> {
        self.list_all("zones", &[]).await
    }

    /// All records in a zone, optionally only those with an exact name.
    pub async fn list_records(
        &self,
        zone_id: &str,
        name: Option<&str>,
    ) -> Result<Vec<DnsRecord>, DnsError> {
        let query: Vec<(&str, &str)> = name.map(|n| ("name", n)).into_iter().collect();
        self.list_all(&format!("zones/{zone_id}/dns_records"), &query)
            .await
    }

    pub async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<DnsRecord, DnsError> {
        let creds = self.credentials();
        let url = record_url(&creds.api_base, zone_id, record_id);
        let request = Self::authorize(self.http.get(url), &creds)?;
        Self::call(request)
            .await?
            .ok_or_else(|| DnsError::RecordNotFound(record_id.to_string()))
    }

    pub async fn create_record(
        &self,
        zone_id: &str,
        input: &RecordInput,
    ) -> Result<DnsRecord, DnsError> {
        let creds = self.credentials();
        let url = format!("{}/zones/{zone_id}/dns_records", base(&creds.api_base));
        let request = Self::authorize(self.http.post(url).json(input), &creds)?;
        let record: DnsRecord = Self::call(request)
            .await?
            .ok_or_else(|| DnsError::Api("create returned no record".to_string()))?;

        tracing::info!(zone_id = %zone_id, record_id = %record.id, name = %record.name, "DNS record created");
        Ok(record)
    }

    pub async fn update_record_by_id(
        &self,
        zone_id: &str,
        record_id: &str,
        input: &RecordInput,
    ) -> Result<DnsRecord, DnsError> {
        let creds = self.credentials();
        let url = record_url(&creds.api_base, zone_id, record_id);
        let request = Self::authorize(self.http.put(url).json(input), &creds)?;
        let record = Self::call(request)
            .await?
            .ok_or_else(|| DnsError::RecordNotFound(record_id.to_string()))?;

        tracing::info!(zone_id = %zone_id, record_id = %record_id, content = %input.content, "DNS record replaced");
        Ok(record)
    }

    pub async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), DnsError> {
        let creds = self.credentials();
        let url = record_url(&creds.api_base, zone_id, record_id);
        let request = Self::authorize(self.http.delete(url), &creds)?;
        Self::call::<serde_json::Value>(request).await?;

        tracing::info!(zone_id = %zone_id, record_id = %record_id, "DNS record deleted");
        Ok(())
    }

    /// Records whose name, content or type contains `query`.
    pub async fn search_records(
        &self,
        zone_id: &str,
        query: &str,
    ) -> Result<Vec<DnsRecord>, DnsError> {
        let records = self.list_records(zone_id, None).await?;
        Ok(records
            .into_iter()
            .filter(|r| matches_query(r, query))
            .collect())
    }

    /// Apply each update independently. A failed entry does not stop the rest.
    pub async fn bulk_update(&self, zone_id: &str, updates: &[BulkUpdate]) -> Vec<BulkResult> {
        let mut results = Vec::with_capacity(updates.len());
        for update in updates {
            let outcome = self.apply_bulk_entry(zone_id, update).await;
            if let Err(e) = &outcome {
                tracing::warn!(zone_id = %zone_id, record_id = %update.record_id, error = %e, "Bulk record update failed");
            }
            results.push(BulkResult {
                record_id: update.record_id.clone(),
                success: outcome.is_ok(),
                error: outcome.err().map(|e| e.to_string()),
            });
        }
        results
    }

    async fn apply_bulk_entry(&self, zone_id: &str, update: &BulkUpdate) -> Result<(), DnsError> {
        let current = self.get_record(zone_id, &update.record_id).await?;
        let input = RecordInput {
            record_type: current.record_type,
            name: current.name,
            content: if update.content.is_empty() {
                current.content
            } else {
                update.content.clone()
            },
            ttl: if update.ttl > 0 { update.ttl } else { current.ttl },
            proxied: update.proxied.unwrap_or(current.proxied),
        };
        self.update_record_by_id(zone_id, &update.record_id, &input)
            .await?;
        Ok(())
    }

    /// Follow `result_info` until the last page.
    async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, DnsError> {
        let creds = self.credentials();
        let url = format!("{}/{path}", base(&creds.api_base));
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let request = self
                .http
                .get(&url)
                .query(query)
                .query(&[("page", page), ("per_page", PAGE_SIZE)]);
            let envelope = Self::send::<Vec<T>>(Self::authorize(request, &creds)?).await?;
            items.extend(envelope.result.unwrap_or_default());

            match envelope.result_info {
                Some(info) if info.page < info.total_pages => page = info.page + 1,
                _ => break,
            }
        }
        Ok(items)
    }
}

fn base(api_base: &str) -> &str {
    api_base.trim_end_matches('/')
}

fn record_url(api_base: &str, zone_id: &str, record_id: &str) -> String {
    format!("{}/zones/{zone_id}/dns_records/{record_id}", base(api_base))
}
