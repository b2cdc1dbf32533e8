//! Secret references
//!
//! A [`SecretString`] holds a *location* such as `env://UC_CLIENT_SECRET` or
//! `kube://secrets/userclouds/sync/client_secret`. The value is only read when
//! [`SecretString::resolve`] is called, and formatting never reveals it.

pub mod prefix;
pub mod providers;

use std::fmt;

use anyhow::{Context, Result};

pub use prefix::SecretPrefix;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretString {
    location: String,
}

impl SecretString {
    pub fn from_location(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Inline plain-text secret
    pub fn dev_literal(value: &str) -> Self {
        Self::from_location(format!("{}{}", SecretPrefix::DevLiteral, value))
    }

    /// Keep values that already carry a known prefix, wrap anything else as a literal
    pub fn from_user_input(value: &str) -> Self {
        if value.is_empty() || SecretPrefix::from_location(value).is_ok() {
            Self::from_location(value)
        } else {
            Self::dev_literal(value)
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_empty()
    }

    /// Check the location has a supported prefix. Empty secrets are valid.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        SecretPrefix::from_location(&self.location).map(|_| ())
    }

    /// Read the secret value from its provider
    pub fn resolve(&self) -> Result<String> {
        if self.is_empty() {
            return Ok(String::new());
        }

        let prefix = SecretPrefix::from_location(&self.location)?;
        providers::provider_for(prefix)
            .get(prefix.value(&self.location))
            .with_context(|| format!("Failed to resolve {} secret", prefix))
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&"*".repeat(self.location.len()))
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString({})", self)
    }
}
