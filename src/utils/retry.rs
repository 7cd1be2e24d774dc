//! Retry policy for paginated fetches
//!
//! The crawl loop never advances the cursor on failure; this module decides
//! how long to wait between attempts on the same cursor and when to stop.

use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt (`None` = unbounded)
    pub max_retries: Option<u32>,

    /// Base delay in milliseconds between attempts
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds (caps growth when the multiplier is > 1)
    pub max_delay_ms: u64,

    /// Multiplier applied per attempt (1.0 = fixed backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: Some(20),
            base_delay_ms: 5000,
            max_delay_ms: 5000,
            backoff_multiplier: 1.0,
        }
    }
}

impl RetryConfig {
    /// Fixed backoff with an optional ceiling on retries
    pub fn fixed(backoff: Duration, max_retries: Option<u32>) -> Self {
        let ms = backoff.as_millis() as u64;
        Self {
            max_retries,
            base_delay_ms: ms,
            max_delay_ms: ms,
            backoff_multiplier: 1.0,
        }
    }

    /// Exponential backoff capped at `max_delay_ms`
    pub fn with_delays(max_retries: Option<u32>, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms,
            backoff_multiplier: 2.0,
        }
    }

    /// Calculate delay before retry number `attempt` (1-based)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = if attempt == 0 {
            0
        } else {
            let scaled =
                self.base_delay_ms as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);
            (scaled as u64).min(self.max_delay_ms.max(self.base_delay_ms))
        };

        Duration::from_millis(delay_ms)
    }

    /// Whether another attempt is allowed after `failures` consecutive failures
    pub fn allows(&self, failures: u32) -> bool {
        match self.max_retries {
            Some(max) => failures <= max,
            None => true,
        }
    }
}
