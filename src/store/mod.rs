//! JSON-file persistence for monitors and event logs.
//!
//! # Responsibilities
//! - Own the monitor definitions managed through the admin API
//! - Keep bounded switch and ip-down logs
//! - Hold the Cloudflare accounts and which one is active
//! - Hold integration settings written through the admin API
//! - Hold the admin login token
//!
//! # Design Decisions
//! - Whole-file JSON, rewritten on every mutation
//! - Writes go to a sibling temp file, then rename over the original
//! - A failed write keeps the in-memory change; callers log the error

pub mod events;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{IntegrationsConfig, MonitorConfig};

pub use events::{offline_hot, IpDownEvent, OfflineHot, SwitchEvent, SwitchReason};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store IO error: {0}")]
    Io(#[from] io::Error),

    #[error("store data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoreData {
    monitors: Vec<MonitorConfig>,
    history: Vec<SwitchEvent>,
    ip_down: Vec<IpDownEvent>,
    accounts: Vec<CloudflareAccount>,
    active_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    integrations: Option<IntegrationsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
}

/// A named set of Cloudflare credentials. A token takes precedence over
/// key + email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudflareAccount {
    pub id: String,
    pub name: String,
    pub api_token: String,
    pub api_key: String,
    pub email: String,
}

pub struct Store {
    path: PathBuf,
    data: RwLock<StoreData>,
}

impl Store {
    /// Open the store at `path`. A missing file yields an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => StoreData::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = ?path,
            monitors = data.monitors.len(),
            history = data.history.len(),
            "Store opened"
        );
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list_monitors(&self) -> Vec<MonitorConfig> {
        self.read().monitors.clone()
    }

    pub fn get_monitor(&self, id: &str) -> Option<MonitorConfig> {
        self.read().monitors.iter().find(|m| m.id == id).cloned()
    }

    /// Insert or replace by id, keeping list position on replace.
    pub fn upsert_monitor(&self, monitor: MonitorConfig) -> Result<(), StoreError> {
        let mut data = self.write();
        match data.monitors.iter_mut().find(|m| m.id == monitor.id) {
            Some(existing) => *existing = monitor,
            None => data.monitors.push(monitor),
        }
        self.save(&data)
    }

    /// Returns false when no monitor had that id.
    pub fn delete_monitor(&self, id: &str) -> Result<bool, StoreError> {
        let mut data = self.write();
        let before = data.monitors.len();
        data.monitors.retain(|m| m.id != id);
        if data.monitors.len() == before {
            return Ok(false);
        }
        self.save(&data)?;
        Ok(true)
    }

    pub fn list_accounts(&self) -> Vec<CloudflareAccount> {
        self.read().accounts.clone()
    }

    pub fn active_account_id(&self) -> Option<String> {
        self.read().active_account.clone()
    }

    /// The account DNS calls authenticate with, if any.
    pub fn active_account(&self) -> Option<CloudflareAccount> {
        let data = self.read();
        let id = data.active_account.as_deref()?;
        data.accounts.iter().find(|a| a.id == id).cloned()
    }

    /// Add an account. The first account becomes the active one.
    pub fn add_account(&self, account: CloudflareAccount) -> Result<(), StoreError> {
        let mut data = self.write();
        if data.active_account.is_none() {
            data.active_account = Some(account.id.clone());
        }
        data.accounts.push(account);
        self.save(&data)
    }

    /// Returns false when no account had that id.
    pub fn update_account(&self, account: CloudflareAccount) -> Result<bool, StoreError> {
        let mut data = self.write();
        let Some(existing) = data.accounts.iter_mut().find(|a| a.id == account.id) else {
            return Ok(false);
        };
        *existing = account;
        self.save(&data)?;
        Ok(true)
    }

    /// Returns false when no account had that id. Removing the active
    /// account activates the first remaining one.
    pub fn delete_account(&self, id: &str) -> Result<bool, StoreError> {
        let mut data = self.write();
        let before = data.accounts.len();
        data.accounts.retain(|a| a.id != id);
        if data.accounts.len() == before {
            return Ok(false);
        }
        if data.active_account.as_deref() == Some(id) {
            data.active_account = data.accounts.first().map(|a| a.id.clone());
        }
        self.save(&data)?;
        Ok(true)
    }

    /// Returns false when no account had that id.
    pub fn activate_account(&self, id: &str) -> Result<bool, StoreError> {
        let mut data = self.write();
        if !data.accounts.iter().any(|a| a.id == id) {
            return Ok(false);
        }
        data.active_account = Some(id.to_string());
        self.save(&data)?;
        Ok(true)
    }

    /// Integration settings saved through the admin API.
    pub fn integrations(&self) -> Option<IntegrationsConfig> {
        self.read().integrations.clone()
    }

    pub fn set_integrations(&self, integrations: IntegrationsConfig) -> Result<(), StoreError> {
        let mut data = self.write();
        data.integrations = Some(integrations);
        self.save(&data)
    }

    pub fn auth_token(&self) -> Option<String> {
        self.read().auth_token.clone().filter(|t| !t.is_empty())
    }

    pub fn set_auth_token(&self, token: &str) -> Result<(), StoreError> {
        let mut data = self.write();
        data.auth_token = Some(token.to_string());
        self.save(&data)
    }

    /// Append and keep the newest `max` entries (`0` keeps everything).
    pub fn append_switch_event(&self, event: SwitchEvent, max: usize) -> Result<(), StoreError> {
        let mut data = self.write();
        data.history.push(event);
        truncate_front(&mut data.history, max);
        self.save(&data)
    }

    pub fn append_ip_down(&self, event: IpDownEvent, max: usize) -> Result<(), StoreError> {
        let mut data = self.write();
        data.ip_down.push(event);
        truncate_front(&mut data.ip_down, max);
        self.save(&data)
    }

    /// Newest first; `limit == 0` returns everything.
    pub fn switch_history(&self, limit: usize) -> Vec<SwitchEvent> {
        newest_first(&self.read().history, limit)
    }

    /// Newest first; `limit == 0` returns everything.
    pub fn ip_down_events(&self, limit: usize) -> Vec<IpDownEvent> {
        newest_first(&self.read().ip_down, limit)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreData> {
        self.data.read().expect("store lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreData> {
        self.data.write().expect("store lock poisoned")
    }

    fn save(&self, data: &StoreData) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(data)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn truncate_front<T>(items: &mut Vec<T>, max: usize) {
    if max > 0 && items.len() > max {
        let excess = items.len() - max;
        items.drain(..excess);
    }
}

fn newest_first<T: Clone>(items: &[T], limit: usize) -> Vec<T> {
    let limit = if limit == 0 { items.len() } else { limit };
    items.iter().rev().take(limit).cloned().collect()
}
