//! Saved tenant contexts repository

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::secret::SecretString;

/// A named endpoint with the credentials used to reach it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub name: String,
    pub url: String,
    pub client_id: String,
    /// Secret reference, never the plain value unless stored as `dev-literal://`
    pub client_secret: SecretString,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<TenantContext> {
    Ok(TenantContext {
        name: row.try_get("name")?,
        url: row.try_get("url")?,
        client_id: row.try_get("client_id")?,
        client_secret: SecretString::from_location(row.try_get::<String, _>("client_secret")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn list_contexts(pool: &SqlitePool) -> Result<Vec<TenantContext>> {
    let rows = sqlx::query(
        "SELECT name, url, client_id, client_secret, created_at, updated_at
         FROM contexts ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list contexts")?;

    rows.iter().map(from_row).collect()
}

pub async fn get_context(pool: &SqlitePool, name: &str) -> Result<Option<TenantContext>> {
    let row = sqlx::query(
        "SELECT name, url, client_id, client_secret, created_at, updated_at
         FROM contexts WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to get context {}", name))?;

    row.as_ref().map(from_row).transpose()
}

/// Insert a context or update an existing one, keeping its creation time
pub async fn upsert_context(
    pool: &SqlitePool,
    name: &str,
    url: &str,
    client_id: &str,
    client_secret: &SecretString,
) -> Result<()> {
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO contexts (name, url, client_id, client_secret, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT(name) DO UPDATE SET
            url = excluded.url,
            client_id = excluded.client_id,
            client_secret = excluded.client_secret,
            updated_at = excluded.updated_at",
    )
    .bind(name)
    .bind(url)
    .bind(client_id)
    .bind(client_secret.location())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to save context {}", name))?;

    Ok(())
}

/// Returns whether a context was removed
pub async fn delete_context(pool: &SqlitePool, name: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM contexts WHERE name = ?")
        .bind(name)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete context {}", name))?;

    Ok(result.rows_affected() > 0)
}
