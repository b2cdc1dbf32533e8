//! Secret providers
//!
//! Each provider resolves the part of a location that follows its prefix.

use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;

use super::prefix::SecretPrefix;

/// Environment variable naming the directory Kubernetes secrets are mounted under
pub const KUBE_SECRETS_DIR_ENV: &str = "UC_KUBE_SECRETS_DIR";
pub const DEFAULT_KUBE_SECRETS_DIR: &str = "/var/run/secrets/userclouds";

pub trait SecretProvider {
    fn get(&self, path: &str) -> Result<String>;
}

/// `env://NAME`
pub struct EnvProvider;

impl SecretProvider for EnvProvider {
    fn get(&self, path: &str) -> Result<String> {
        let value = std::env::var(path)
            .with_context(|| format!("Can't load secret from environment variable {}", path))?;
        if value.is_empty() {
            anyhow::bail!("Secret from environment variable {} is empty", path);
        }
        Ok(value)
    }
}

/// `dev://BASE64` and `dev-literal://VALUE`
pub struct DevProvider {
    decode: bool,
}

impl DevProvider {
    pub fn base64() -> Self {
        Self { decode: true }
    }

    pub fn literal() -> Self {
        Self { decode: false }
    }
}

impl SecretProvider for DevProvider {
    fn get(&self, path: &str) -> Result<String> {
        if !self.decode {
            return Ok(path.to_string());
        }

        let bytes = STANDARD
            .decode(path)
            .context("Dev secret is not valid base64")?;
        String::from_utf8(bytes).context("Dev secret is not valid UTF-8")
    }
}

/// `kube://secrets/PATH`, read from a mounted secret volume
pub struct KubeMountProvider {
    mount_dir: PathBuf,
}

impl KubeMountProvider {
    pub fn new(mount_dir: impl Into<PathBuf>) -> Self {
        Self {
            mount_dir: mount_dir.into(),
        }
    }

    pub fn from_env() -> Self {
        let dir = std::env::var(KUBE_SECRETS_DIR_ENV)
            .ok()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_KUBE_SECRETS_DIR.to_string());
        Self::new(dir)
    }
}

/// Turn a `service/name` secret path into a Kubernetes-compatible name
pub fn path_to_secret_name(path: &str) -> String {
    path.replace('_', "-").replace('/', ".")
}

impl SecretProvider for KubeMountProvider {
    fn get(&self, path: &str) -> Result<String> {
        let name = path_to_secret_name(path);
        let file = self.mount_dir.join(&name).join("value");
        debug!("Reading kubernetes secret {} from {}", name, file.display());

        let value = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read kubernetes secret {} at {}", name, file.display()))?;
        Ok(value.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// `aws://secrets/PATH`
pub struct AwsProvider;

impl SecretProvider for AwsProvider {
    fn get(&self, path: &str) -> Result<String> {
        anyhow::bail!(
            "AWS Secrets Manager is not supported by this build (secret {}); use env://, kube://secrets/ or dev-literal://",
            path
        )
    }
}

/// Provider responsible for `prefix`
pub fn provider_for(prefix: SecretPrefix) -> Box<dyn SecretProvider> {
    match prefix {
        SecretPrefix::Env => Box::new(EnvProvider),
        SecretPrefix::Dev => Box::new(DevProvider::base64()),
        SecretPrefix::DevLiteral => Box::new(DevProvider::literal()),
        SecretPrefix::Kubernetes => Box::new(KubeMountProvider::from_env()),
        SecretPrefix::Aws => Box::new(AwsProvider),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_provider() {
        // SAFETY: test-only variable name not read by other tests
        unsafe { std::env::set_var("AUTHZ_SYNC_TEST_ENV_PROVIDER", "foo") };

        assert_eq!(EnvProvider.get("AUTHZ_SYNC_TEST_ENV_PROVIDER").unwrap(), "foo");
        assert!(EnvProvider.get("AUTHZ_SYNC_TEST_ENV_PROVIDER_MISSING").is_err());
    }

    #[test]
    fn test_dev_providers() {
        assert_eq!(DevProvider::base64().get("Zm9v").unwrap(), "foo");
        assert!(DevProvider::base64().get("not base64!").is_err());
        assert_eq!(DevProvider::literal().get("Zm9v").unwrap(), "Zm9v");
    }

    #[test]
    fn test_path_to_secret_name() {
        assert_eq!(path_to_secret_name("service/name"), "service.name");
        assert_eq!(path_to_secret_name("my_service/client_secret"), "my-service.client-secret");
        assert_eq!(path_to_secret_name("plain"), "plain");
    }

    #[test]
    fn test_kube_mount_provider_reads_value_file() {
        let dir = tempfile::tempdir().unwrap();
        let secret_dir = dir.path().join("userclouds.authz-sync.client-secret");
        std::fs::create_dir_all(&secret_dir).unwrap();
        std::fs::write(secret_dir.join("value"), "s3cret\n").unwrap();

        let provider = KubeMountProvider::new(dir.path());
        assert_eq!(provider.get("userclouds/authz_sync/client_secret").unwrap(), "s3cret");
        assert!(provider.get("userclouds/missing").is_err());
    }

    #[test]
    fn test_aws_provider_is_unsupported() {
        let err = AwsProvider.get("userclouds/prod/secret").unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }
}
