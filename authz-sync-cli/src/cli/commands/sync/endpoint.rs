//! Endpoint resolution for one side of a sync
//!
//! Explicit flags win over the saved context. The client secret comes from
//! the named environment variable when it is set and non-empty, otherwise
//! from the context's stored secret reference.

use std::fmt;

use anyhow::{Context, Result};

use super::TenantSyncArgs;
use crate::api::CredentialSet;
use crate::api::http::normalize_base_url;
use crate::config::repository::contexts::TenantContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl Side {
    fn flag(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Destination => "destination",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

/// Flags that describe one side
#[derive(Debug, Clone)]
pub struct EndpointFlags {
    pub context: Option<String>,
    pub url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret_var: String,
}

impl TenantSyncArgs {
    pub fn endpoint_flags(&self, side: Side) -> EndpointFlags {
        match side {
            Side::Source => EndpointFlags {
                context: self.source.clone(),
                url: self.source_url.clone(),
                client_id: self.source_client_id.clone(),
                client_secret_var: self.source_client_secret_var.clone(),
            },
            Side::Destination => EndpointFlags {
                context: self.destination.clone(),
                url: self.destination_url.clone(),
                client_id: self.destination_client_id.clone(),
                client_secret_var: self.destination_client_secret_var.clone(),
            },
        }
    }
}

/// Fully resolved tenant endpoint
#[derive(Debug, Clone)]
pub struct ResolvedEndpoint {
    pub url: String,
    pub credentials: CredentialSet,
}

/// Combine flags, saved context and environment into an endpoint.
/// `env` looks up environment variables.
pub fn resolve_endpoint(
    side: Side,
    flags: &EndpointFlags,
    context: Option<&TenantContext>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedEndpoint> {
    let flag = side.flag();

    let url = flags
        .url
        .clone()
        .filter(|u| !u.trim().is_empty())
        .or_else(|| context.map(|c| c.url.clone()))
        .with_context(|| format!("Missing {side} URL: pass --{flag}-url or --{flag} <context>"))?;

    normalize_base_url(&url).with_context(|| format!("Invalid {side} URL"))?;

    let client_id = flags
        .client_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .or_else(|| context.map(|c| c.client_id.clone()))
        .filter(|id| !id.is_empty())
        .with_context(|| {
            format!("Missing {side} client id: pass --{flag}-client-id or --{flag} <context>")
        })?;

    let client_secret = match env(&flags.client_secret_var).filter(|s| !s.is_empty()) {
        Some(secret) => secret,
        None => {
            let stored = context
                .map(|c| &c.client_secret)
                .filter(|s| !s.is_empty())
                .with_context(|| {
                    format!(
                        "Missing {side} client secret: set ${} or save one in a context (--{flag} <context>)",
                        flags.client_secret_var
                    )
                })?;
            stored
                .resolve()
                .with_context(|| format!("Failed to resolve the stored {side} client secret"))?
        }
    };

    Ok(ResolvedEndpoint {
        url,
        credentials: CredentialSet {
            client_id,
            client_secret: client_secret.into(),
        },
    })
}
