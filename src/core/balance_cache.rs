//! Cache coherence for balance sheets.
//!
//! The cache only accelerates reads. Every failure here degrades to a store
//! read, never to a wrong answer.

use crate::core::errors::LedgerError;
use crate::core::models::balance::BalanceSheet;
use crate::infrastructure::bounded;
use crate::infrastructure::cache::{Cache, cache_keys::balance_key};
use std::time::Duration;
use tracing::{debug, error, warn};

pub const DEFAULT_BALANCE_TTL: Duration = Duration::from_secs(30 * 60);

pub struct BalanceCache<C: Cache> {
    cache: C,
    ttl: Duration,
    timeout: Duration,
}

impl<C: Cache> BalanceCache<C> {
    pub fn new(cache: C, ttl: Duration, timeout: Duration) -> Self {
        BalanceCache { cache, ttl, timeout }
    }

    /// Writes a freshly computed sheet under the group's key. If the write
    /// fails the key is deleted instead; the error is returned only when
    /// neither succeeded, since the entry may then outlive the new sheet.
    pub async fn invalidate_or_refresh(&self, group_id: &str, balances: &BalanceSheet) -> Result<(), LedgerError> {
        let key = balance_key(group_id);
        let refreshed = match serde_json::to_string(balances) {
            Ok(value) => bounded("cache set", self.timeout, self.cache.set(&key, value, self.ttl)).await,
            Err(e) => Err(LedgerError::CacheError(format!("Failed to serialize balances: {}", e))),
        };
        let Err(refresh_err) = refreshed else {
            debug!(group_id, "balance cache refreshed");
            return Ok(());
        };

        warn!(group_id, error = %refresh_err, "balance cache refresh failed, invalidating");
        bounded("cache delete", self.timeout, self.cache.delete(&key))
            .await
            .map_err(|delete_err| {
                error!(group_id, error = %delete_err, "balance cache entry could not be invalidated");
                LedgerError::CacheError(format!(
                    "refresh failed ({}) and invalidation failed ({})",
                    refresh_err, delete_err
                ))
            })
    }

    /// Cached sheet for the group. Errors and undecodable entries count as a miss.
    pub async fn lookup(&self, group_id: &str) -> Option<BalanceSheet> {
        let key = balance_key(group_id);
        let raw = match bounded("cache get", self.timeout, self.cache.get(&key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(group_id, error = %e, "balance cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(balances) => Some(balances),
            Err(e) => {
                warn!(group_id, error = %e, "discarding undecodable balance cache entry");
                None
            }
        }
    }

    /// Best-effort repopulation after a read fell back to the store.
    pub async fn populate(&self, group_id: &str, balances: &BalanceSheet) {
        let key = balance_key(group_id);
        let result = match serde_json::to_string(balances) {
            Ok(value) => bounded("cache set", self.timeout, self.cache.set(&key, value, self.ttl)).await,
            Err(e) => Err(LedgerError::CacheError(e.to_string())),
        };
        if let Err(e) = result {
            warn!(group_id, error = %e, "balance cache repopulation failed");
        }
    }
}
