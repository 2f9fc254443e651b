use crate::infrastructure::Timeouts;
use crate::worker::WorkerSettings;
use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub expense_queue: String,
    pub worker_count: usize,
    pub max_deliveries: u32,
    pub retry_delay_ms: u64,
    pub cache_ttl_secs: u64,
    pub store_timeout_ms: u64,
    pub cache_timeout_ms: u64,
    pub queue_timeout_ms: u64,
    pub publish_attempts: u32,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: env_or("PORT", 8080),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            expense_queue: env::var("EXPENSE_QUEUE").unwrap_or_else(|_| "expense_added".to_string()),
            worker_count: env_or::<usize>("WORKER_COUNT", 2).max(1),
            max_deliveries: env_or::<u32>("MAX_DELIVERIES", 5).max(1),
            retry_delay_ms: env_or("RETRY_DELAY_MS", 500),
            cache_ttl_secs: env_or("CACHE_TTL_SECS", 30 * 60),
            store_timeout_ms: env_or("STORE_TIMEOUT_MS", 5_000),
            cache_timeout_ms: env_or("CACHE_TIMEOUT_MS", 1_000),
            queue_timeout_ms: env_or("QUEUE_TIMEOUT_MS", 5_000),
            publish_attempts: env_or::<u32>("PUBLISH_ATTEMPTS", 3).max(1),
        }
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            store: Duration::from_millis(self.store_timeout_ms),
            cache: Duration::from_millis(self.cache_timeout_ms),
            queue: Duration::from_millis(self.queue_timeout_ms),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            queue_name: self.expense_queue.clone(),
            max_deliveries: self.max_deliveries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            queue_timeout: Duration::from_millis(self.queue_timeout_ms),
        }
    }
}

// Only the binary reads this; library components take explicit settings.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
