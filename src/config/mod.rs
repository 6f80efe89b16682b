//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<IntegrationsConfig>
//!     → DNS provider and notifier observe new credentials
//!
//! Per monitor, on activation:
//!     MonitorConfig → validate_monitor → MonitorSpec
//! ```
//!
//! # Design Decisions
//! - Only integration settings are hot-reloaded; monitors live in the store
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, CloudflareConfig, IntegrationsConfig, MonitorConfig, NotificationsConfig,
};
pub use validation::{validate_monitor, InvalidMonitor, ValidationError};
