//! Transport resilience
//!
//! Retry policy and request logging configuration for the HTTP client.

pub mod config;
pub mod retry;

pub use config::ResilienceConfig;
