pub mod cache;
pub mod logging;
pub mod queue;
pub mod storage;

use crate::core::errors::LedgerError;
use std::future::Future;
use std::time::Duration;

/// Deadlines applied to calls against external collaborators.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub store: Duration,
    pub cache: Duration,
    pub queue: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            store: Duration::from_secs(5),
            cache: Duration::from_secs(1),
            queue: Duration::from_secs(5),
        }
    }
}

/// Runs `call` with a deadline. An elapsed deadline becomes [`LedgerError::Timeout`].
pub async fn bounded<T, F>(operation: &str, limit: Duration, call: F) -> Result<T, LedgerError>
where
    F: Future<Output = Result<T, LedgerError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(LedgerError::Timeout(format!(
            "{} did not complete within {}ms",
            operation,
            limit.as_millis()
        ))),
    }
}
