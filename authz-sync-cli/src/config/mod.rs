//! Local configuration store
//!
//! Saved tenant contexts and the current-context pointer live in a SQLite
//! database under the user's config directory.

pub mod repository;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::secret::SecretString;
use repository::contexts::{self, TenantContext};
use repository::settings::{self, CURRENT_CONTEXT_KEY};

pub struct Config {
    pub pool: SqlitePool,
}

impl Config {
    /// Default database location: `<config dir>/authz-sync/config.db`
    pub fn default_db_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine the user config directory")?;
        Ok(dir.join("authz-sync").join("config.db"))
    }

    /// Open (creating if needed) the database at `path`, or at the default location
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_db_path()?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        debug!("Opening config database at {}", path.display());
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open config database {}", path.display()))?;

        Self::with_pool(pool).await
    }

    /// Fresh in-memory database
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let options: SqliteConnectOptions = "sqlite::memory:".parse()?;
        // every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        repository::migrations::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn list_contexts(&self) -> Result<Vec<TenantContext>> {
        contexts::list_contexts(&self.pool).await
    }

    pub async fn get_context(&self, name: &str) -> Result<Option<TenantContext>> {
        contexts::get_context(&self.pool, name).await
    }

    /// Look up a context that must exist
    pub async fn require_context(&self, name: &str) -> Result<TenantContext> {
        self.get_context(name)
            .await?
            .with_context(|| format!("Context '{}' not found. Use 'authz-sync context list' to see saved contexts", name))
    }

    /// Create or update a context. The first saved context becomes current.
    pub async fn save_context(
        &self,
        name: &str,
        url: &str,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<()> {
        if name.trim().is_empty() {
            anyhow::bail!("Context name cannot be empty");
        }
        client_secret.validate().context("Invalid client secret reference")?;

        contexts::upsert_context(&self.pool, name, url, client_id, client_secret).await?;

        if self.current_context().await?.is_none() {
            self.set_current_context(name).await?;
        }
        Ok(())
    }

    /// Delete a context, clearing the current pointer if it named it
    pub async fn delete_context(&self, name: &str) -> Result<()> {
        if !contexts::delete_context(&self.pool, name).await? {
            anyhow::bail!("Context '{}' not found", name);
        }

        if self.current_context().await?.as_deref() == Some(name) {
            settings::delete_setting(&self.pool, CURRENT_CONTEXT_KEY).await?;
        }
        Ok(())
    }

    pub async fn current_context(&self) -> Result<Option<String>> {
        settings::get_setting(&self.pool, CURRENT_CONTEXT_KEY).await
    }

    pub async fn set_current_context(&self, name: &str) -> Result<()> {
        if self.get_context(name).await?.is_none() {
            anyhow::bail!("Context '{}' not found", name);
        }
        settings::set_setting(&self.pool, CURRENT_CONTEXT_KEY, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::dev_literal("s3cret")
    }

    #[tokio::test]
    async fn test_save_and_get_context() {
        let config = Config::in_memory().await.unwrap();

        config
            .save_context("staging", "https://staging.example.com", "client-a", &secret())
            .await
            .unwrap();

        let ctx = config.require_context("staging").await.unwrap();
        assert_eq!(ctx.url, "https://staging.example.com");
        assert_eq!(ctx.client_id, "client-a");
        assert_eq!(ctx.client_secret.location(), "dev-literal://s3cret");
        assert_eq!(ctx.client_secret.resolve().unwrap(), "s3cret");
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let config = Config::in_memory().await.unwrap();

        config
            .save_context("prod", "https://old.example.com", "client", &secret())
            .await
            .unwrap();
        let before = config.require_context("prod").await.unwrap();

        config
            .save_context("prod", "https://new.example.com", "client", &secret())
            .await
            .unwrap();
        let after = config.require_context("prod").await.unwrap();

        assert_eq!(after.url, "https://new.example.com");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(config.list_contexts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_first_context_becomes_current() {
        let config = Config::in_memory().await.unwrap();
        assert_eq!(config.current_context().await.unwrap(), None);

        config.save_context("a", "https://a.example.com", "a", &secret()).await.unwrap();
        config.save_context("b", "https://b.example.com", "b", &secret()).await.unwrap();
        assert_eq!(config.current_context().await.unwrap().as_deref(), Some("a"));

        config.set_current_context("b").await.unwrap();
        assert_eq!(config.current_context().await.unwrap().as_deref(), Some("b"));

        assert!(config.set_current_context("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_current_context_clears_pointer() {
        let config = Config::in_memory().await.unwrap();
        config.save_context("a", "https://a.example.com", "a", &secret()).await.unwrap();
        config.save_context("b", "https://b.example.com", "b", &secret()).await.unwrap();

        config.delete_context("b").await.unwrap();
        assert_eq!(config.current_context().await.unwrap().as_deref(), Some("a"));

        config.delete_context("a").await.unwrap();
        assert_eq!(config.current_context().await.unwrap(), None);
        assert!(config.delete_context("a").await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_secret_reference_is_rejected() {
        let config = Config::in_memory().await.unwrap();
        let result = config
            .save_context("a", "https://a.example.com", "a", &SecretString::from_location("plain"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.db");

        let config = Config::load(Some(&path)).await.unwrap();
        config.save_context("a", "https://a.example.com", "a", &secret()).await.unwrap();
        drop(config);

        let reopened = Config::load(Some(&path)).await.unwrap();
        assert!(reopened.get_context("a").await.unwrap().is_some());
    }
}
