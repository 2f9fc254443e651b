pub mod cache_keys;
pub mod in_memory;

use crate::core::errors::LedgerError;
use async_trait::async_trait;
use std::time::Duration;

/// String key/value cache with per-entry expiry.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, LedgerError>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), LedgerError>;
    async fn delete(&self, key: &str) -> Result<(), LedgerError>;
}
