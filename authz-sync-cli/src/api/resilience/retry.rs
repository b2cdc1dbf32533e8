//! Retry policy with exponential backoff
//!
//! Only idempotent reads go through the policy. Mutations are sent once so a
//! timed-out create can never be replayed against the destination.

use rand::Rng;
use std::time::Duration;

/// Retry behaviour for transport-level failures
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first one (1 = no retries)
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Add up to ±25% random jitter to each delay
    pub jitter: bool,
    /// HTTP status codes worth another attempt
    pub retry_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
            retry_status_codes: vec![429, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Single attempt, no waiting
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
            ..Self::default()
        }
    }

    /// Whether a response status should be retried
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }

    /// Whether another attempt is allowed after `attempt` attempts have been made
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before the attempt following `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base = self.base_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32 - 1);
        let capped = base.min(self.max_delay.as_millis() as f64);

        let delay_ms = if self.jitter && capped > 0.0 {
            let spread = capped * 0.25;
            let jitter = rand::rng().random_range(-spread..=spread);
            (capped + jitter).max(0.0)
        } else {
            capped
        };

        Duration::from_millis(delay_ms as u64)
    }
}
