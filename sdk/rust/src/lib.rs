//! Typed client for the DNS failover admin API.

mod client;
mod types;

pub use client::{AdminClient, SdkError};
pub use types::*;
