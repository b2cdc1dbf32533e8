//! Secret location prefixes

use anyhow::Result;

/// Where a secret lives, decided by the location prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretPrefix {
    Aws,
    Dev,
    DevLiteral,
    Kubernetes,
    Env,
}

impl SecretPrefix {
    pub const ALL: [SecretPrefix; 5] = [
        SecretPrefix::Aws,
        SecretPrefix::Dev,
        SecretPrefix::DevLiteral,
        SecretPrefix::Kubernetes,
        SecretPrefix::Env,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecretPrefix::Aws => "aws://secrets/",
            SecretPrefix::Dev => "dev://",
            SecretPrefix::DevLiteral => "dev-literal://",
            SecretPrefix::Kubernetes => "kube://secrets/",
            SecretPrefix::Env => "env://",
        }
    }

    /// Find the prefix of `location`
    pub fn from_location(location: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|prefix| location.starts_with(prefix.as_str()))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid secret prefix, expected one of: {}",
                    Self::ALL.map(|p| p.as_str()).join(", ")
                )
            })
    }

    /// `location` with this prefix stripped
    pub fn value<'a>(&self, location: &'a str) -> &'a str {
        location.strip_prefix(self.as_str()).unwrap_or(location)
    }
}

impl std::fmt::Display for SecretPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
