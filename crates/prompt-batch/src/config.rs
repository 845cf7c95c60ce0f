use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry and cache settings for the batch runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Retries per chunk for transient errors (0 disables retrying)
    pub max_retries: u32,
    /// Backoff before the first retry, doubled on each further retry
    pub initial_backoff_ms: u64,
    /// Upper bound on a single backoff
    pub max_backoff_ms: u64,
    /// Ask the generator to use its cache; only honored on a chunk's first attempt
    pub use_cache: bool,
    /// Limit on a single generation call; an expired call counts as a transient error
    pub request_timeout_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 30_000,
            use_cache: false,
            request_timeout_ms: 600_000,
        }
    }
}

impl BatchConfig {
    pub const fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub const fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_ms == 0 {
            return Err("request_timeout_ms must be greater than 0".to_string());
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(format!(
                "max_backoff_ms ({}) must be >= initial_backoff_ms ({})",
                self.max_backoff_ms, self.initial_backoff_ms
            ));
        }
        Ok(())
    }
}
