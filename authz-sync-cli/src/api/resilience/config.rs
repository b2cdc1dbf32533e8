//! Resilience configuration with builder pattern
//!
//! Bundles the transport retry policy and request logging switches with
//! sane defaults.

use super::retry::RetryConfig;
use std::time::Duration;

/// Transport resilience configuration for one HTTP client
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    pub monitoring: MonitoringConfig,
    /// Per-request timeout enforced by the HTTP client
    pub request_timeout: Duration,
    /// Page size requested from list endpoints
    pub page_size: u32,
}

/// Request logging configuration
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    /// Log every request/response line at debug level
    pub request_logging: bool,
    /// Include response bodies of failed requests in errors
    pub error_bodies: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            request_logging: true,
            error_bodies: true,
        }
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            monitoring: MonitoringConfig::default(),
            request_timeout: Duration::from_secs(60),
            page_size: 1000,
        }
    }
}

impl ResilienceConfig {
    /// Create a new builder for ResilienceConfig
    pub fn builder() -> ResilienceConfigBuilder {
        ResilienceConfigBuilder::new()
    }

    /// Disable all resilience features (for testing)
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self {
            retry: RetryConfig::disabled(),
            monitoring: MonitoringConfig {
                request_logging: false,
                error_bodies: true,
            },
            request_timeout: Duration::from_secs(10),
            page_size: 1000,
        }
    }
}

/// Builder for ResilienceConfig
#[derive(Debug)]
pub struct ResilienceConfigBuilder {
    config: ResilienceConfig,
}

impl ResilienceConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ResilienceConfig::default(),
        }
    }

    /// Configure retry behavior
    #[cfg(test)]
    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set max attempts (1 disables retries)
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts.max(1);
        self
    }

    /// Enable/disable request logging
    pub fn request_logging(mut self, enabled: bool) -> Self {
        self.config.monitoring.request_logging = enabled;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.config.page_size = size.max(1);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> ResilienceConfig {
        self.config
    }
}

impl Default for ResilienceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
