//! Authorization service data models
//!
//! Wire representations of the four authorization graph entities, plus the
//! token and list envelopes used by the HTTP client.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A class of principal/resource nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectType {
    pub id: Uuid,
    pub type_name: String,
}

/// An instance of an ObjectType
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub id: Uuid,
    pub type_id: Uuid,
    /// Optional human-readable name, unique per type in the owning store.
    /// `None` and `Some("")` are different values.
    #[serde(default)]
    pub alias: Option<String>,
}

/// A named permission granted by an EdgeType
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub direct: bool,
    #[serde(default)]
    pub inherit: bool,
    #[serde(default)]
    pub propagate: bool,
}

#[cfg(test)]
impl Attribute {
    /// Attribute granted directly on the target object
    pub fn direct(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direct: true,
            inherit: false,
            propagate: false,
        }
    }
}

/// A class of directed relationship between two ObjectTypes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeType {
    pub id: Uuid,
    pub type_name: String,
    pub source_object_type_id: Uuid,
    pub target_object_type_id: Uuid,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// An instance of an EdgeType connecting two Objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: Uuid,
    pub edge_type_id: Uuid,
    pub source_object_id: Uuid,
    pub target_object_id: Uuid,
}

/// One page of a cursor-paginated list response
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub next: Option<String>,
}

/// OAuth2 token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Cached bearer token
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenInfo {
    /// Whether the token is still usable, leaving `margin_secs` of headroom
    pub fn is_valid(&self, margin_secs: i64) -> bool {
        Utc::now() + chrono::Duration::seconds(margin_secs) < self.expires_at
    }
}

/// Client-credentials pair for one tenant
#[derive(Debug, Clone)]
pub struct CredentialSet {
    pub client_id: String,
    pub client_secret: SecretString,
}
