//! Authorization service API module
//!
//! Entity models, the client contract the sync engine depends on, and the
//! HTTP implementation with token management and read retries.

pub mod auth;
pub mod client;
pub mod http;
pub mod models;
pub mod pagination;
pub mod resilience;

pub use client::AuthzClient;
pub use http::AuthzHttpClient;
pub use models::CredentialSet;
pub use pagination::{Cursor, Page};
pub use resilience::ResilienceConfig;
