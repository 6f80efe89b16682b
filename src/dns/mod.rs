//! DNS record updates.
//!
//! # Responsibilities
//! - Point a named record at a new IP with a proxied (CDN) flag
//! - List zones, manage individual records, search and bulk-edit them
//!
//! # Design Decisions
//! - Update-by-name: the record is looked up, then rewritten in place
//! - Credentials are read on every call so hot-reloaded config and account
//!   switches apply

pub mod cloudflare;
pub mod records;

use async_trait::async_trait;
use thiserror::Error;

pub use cloudflare::CloudflareDns;
pub use records::{BulkResult, BulkUpdate, DnsRecord, RecordInput, Zone};

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("no DNS credentials configured")]
    MissingCredentials,

    #[error("no DNS record found for {0}")]
    RecordNotFound(String),

    #[error("DNS resource not found: {0}")]
    NotFound(String),

    #[error("DNS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("DNS API error: {0}")]
    Api(String),
}

/// Writes DNS records.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    async fn update_record(
        &self,
        zone_id: &str,
        name: &str,
        ip: &str,
        proxied: bool,
    ) -> Result<(), DnsError>;
}
