use crate::core::balance_cache::BalanceCache;
use crate::core::engine;
use crate::core::errors::LedgerError;
use crate::core::models::balance::{Balance, BalanceSheet};
use crate::core::services::validate_identifier;
use crate::infrastructure::cache::Cache;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::{Timeouts, bounded};
use chrono::Utc;
use tracing::{debug, warn};

/// Recomputes, stores and serves group balance sheets.
pub struct BalanceService<S: Storage, C: Cache> {
    storage: S,
    cache: BalanceCache<C>,
    timeouts: Timeouts,
}

impl<S: Storage, C: Cache> BalanceService<S, C> {
    pub fn new(storage: S, cache: BalanceCache<C>, timeouts: Timeouts) -> Self {
        BalanceService {
            storage,
            cache,
            timeouts,
        }
    }

    pub fn cache(&self) -> &BalanceCache<C> {
        &self.cache
    }

    /// Derives the group's sheet from its full, current expense set.
    pub async fn compute(&self, group_id: &str) -> Result<BalanceSheet, LedgerError> {
        let expenses = bounded(
            "find expenses",
            self.timeouts.store,
            self.storage.find_expenses_by_group(group_id),
        )
        .await?;
        let balances = engine::recalculate(&expenses);
        if !engine::is_balanced(&balances) {
            warn!(group_id, imbalance = %engine::imbalance(&balances), "balance sheet does not sum to zero");
        }
        debug!(group_id, expenses = expenses.len(), members = balances.len(), "balances computed");
        Ok(balances)
    }

    /// Replaces the stored sheet of the group.
    pub async fn persist(&self, group_id: &str, balances: BalanceSheet) -> Result<Balance, LedgerError> {
        let balance = Balance {
            group_id: group_id.to_string(),
            balances,
            updated_at: Utc::now(),
        };
        bounded("upsert balance", self.timeouts.store, self.storage.upsert_balance(balance.clone())).await?;
        Ok(balance)
    }

    /// Balances of a group, preferring the cache.
    ///
    /// A group without a stored sheet yields an empty map. Never triggers
    /// recalculation, so results are as fresh as the last worker run.
    pub async fn get_balances(&self, group_id: &str) -> Result<BalanceSheet, LedgerError> {
        validate_identifier(group_id)?;

        if let Some(balances) = self.cache.lookup(group_id).await {
            debug!(group_id, "balance cache hit");
            return Ok(balances);
        }

        let stored = bounded("find balance", self.timeouts.store, self.storage.find_balance(group_id)).await?;
        match stored {
            Some(balance) => {
                self.cache.populate(group_id, &balance.balances).await;
                Ok(balance.balances)
            }
            // nothing to mirror yet; the worker fills the cache on first recalculation
            None => Ok(BalanceSheet::new()),
        }
    }
}
