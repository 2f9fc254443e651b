use crate::core::errors::LedgerError;
use crate::infrastructure::cache::Cache;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryCache {
    cache: Arc<RwLock<HashMap<String, (String, DateTime<Utc>)>>>,
    failing_calls: Arc<AtomicU32>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` cache calls of any kind fail.
    pub fn fail_next_calls(&self, n: u32) {
        self.failing_calls.store(n, Ordering::SeqCst);
    }

    fn unavailable(&self) -> Option<LedgerError> {
        self.failing_calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|_| LedgerError::CacheError("cache unavailable".to_string()))
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        if let Some(err) = self.unavailable() {
            return Err(err);
        }
        let mut cache = self.cache.write().await;
        match cache.get(key) {
            Some((_, expiry)) if *expiry <= Utc::now() => {
                cache.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: std::time::Duration) -> Result<(), LedgerError> {
        if let Some(err) = self.unavailable() {
            return Err(err);
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| LedgerError::CacheError(format!("Failed to convert TTL: {}", e)))?;
        let mut cache = self.cache.write().await;
        cache.insert(key.to_string(), (value, Utc::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), LedgerError> {
        if let Some(err) = self.unavailable() {
            return Err(err);
        }
        let mut cache = self.cache.write().await;
        cache.remove(key);
        Ok(())
    }
}
