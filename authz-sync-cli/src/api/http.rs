//! HTTP implementation of [`AuthzClient`]
//!
//! Talks to the authorization service REST API:
//! - `GET  /authz/{collection}?starting_after=..&limit=..` for lists
//! - `POST /authz/{collection}` with a wrapped entity body for creates
//! - `DELETE /authz/{collection}/{id}` for deletes
//!
//! Reads go through the retry policy; mutations are sent exactly once.

use std::future::Future;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::auth::AuthManager;
use super::client::AuthzClient;
use super::models::{Attribute, CredentialSet, Edge, EdgeType, ListResponse, Object, ObjectType};
use super::pagination::{Cursor, CursorTrail, Page};
use super::resilience::ResilienceConfig;

const OBJECT_TYPES: &str = "objecttypes";
const OBJECTS: &str = "objects";
const EDGE_TYPES: &str = "edgetypes";
const EDGES: &str = "edges";

/// Authorization service client for one tenant
pub struct AuthzHttpClient {
    base_url: Url,
    endpoint: String,
    http: reqwest::Client,
    auth: AuthManager,
    resilience: ResilienceConfig,
}

impl AuthzHttpClient {
    /// Create a client for the tenant at `tenant_url`
    pub fn new(
        tenant_url: &str,
        credentials: CredentialSet,
        resilience: ResilienceConfig,
    ) -> Result<Self> {
        let base_url = normalize_base_url(tenant_url)?;

        let http = reqwest::Client::builder()
            .timeout(resilience.request_timeout)
            .user_agent(concat!("authz-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let auth = AuthManager::new(http.clone(), &base_url, credentials)?;
        debug!("Using token endpoint {} for {}", auth.token_url(), base_url);

        Ok(Self {
            endpoint: tenant_url.trim_end_matches('/').to_string(),
            base_url,
            http,
            auth,
            resilience,
        })
    }

    fn collection_url(&self, collection: &str) -> Result<Url> {
        self.base_url
            .join(&format!("authz/{}", collection))
            .with_context(|| format!("Invalid URL for collection {}", collection))
    }

    fn entity_url(&self, collection: &str, id: Uuid) -> Result<Url> {
        self.base_url
            .join(&format!("authz/{}/{}", collection, id))
            .with_context(|| format!("Invalid URL for {}/{}", collection, id))
    }

    /// Build an authenticated request
    async fn request(
        &self,
        method: Method,
        url: Url,
        cancel: &CancellationToken,
    ) -> Result<reqwest::RequestBuilder> {
        let token = self.auth.bearer_token(cancel).await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// GET with the retry policy applied
    async fn get_with_retry(&self, url: Url, cancel: &CancellationToken) -> Result<reqwest::Response> {
        let retry = &self.resilience.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;

            if self.resilience.monitoring.request_logging {
                debug!("GET {} (attempt {})", url, attempt);
            }

            let request = self.request(Method::GET, url.clone(), cancel).await?;
            let result = cancellable(cancel, &url, request.send()).await?;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if retry.should_retry_status(status.as_u16()) && retry.has_attempts_left(attempt) {
                        let wait = retry_after(&response)
                            .map(|d| d.min(retry.max_delay))
                            .unwrap_or_else(|| retry.backoff(attempt));
                        warn!(
                            "GET {} returned {}, retrying in {}ms",
                            url,
                            status,
                            wait.as_millis()
                        );
                        sleep_cancellable(cancel, wait).await?;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) if retry.has_attempts_left(attempt) => {
                    let wait = retry.backoff(attempt);
                    warn!("GET {} failed: {}, retrying in {}ms", url, e, wait.as_millis());
                    sleep_cancellable(cancel, wait).await?;
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("GET {} failed after {} attempts", url, attempt)));
                }
            }
        }
    }

    /// Fetch one page of a collection
    async fn get_page<T: DeserializeOwned>(
        &self,
        collection: &str,
        cursor: &Cursor,
        cancel: &CancellationToken,
    ) -> Result<Page<T>> {
        let mut url = self.collection_url(collection)?;
        {
            let mut query = url.query_pairs_mut();
            if !cursor.is_begin() {
                query.append_pair("starting_after", cursor.as_str());
            }
            query.append_pair("limit", &self.resilience.page_size.to_string());
        }

        let response = self.get_with_retry(url.clone(), cancel).await?;
        let response = self.check_status(Method::GET, &url, response).await?;

        let body: ListResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} page from {}", collection, url))?;

        Ok(body.into())
    }

    /// Follow pagination to the end of a collection
    async fn get_all<T: DeserializeOwned>(
        &self,
        collection: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        let mut all = Vec::new();
        let mut cursor = Cursor::begin();
        let mut trail = CursorTrail::new();

        loop {
            let page: Page<T> = self.get_page(collection, &cursor, cancel).await?;
            all.extend(page.entities);

            if !page.has_next {
                break;
            }
            trail
                .advance(&page.next)
                .with_context(|| format!("Paging through {} stopped after cursor {}", collection, cursor))?;
            cursor = page.next;
        }

        Ok(all)
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        collection: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let url = self.collection_url(collection)?;
        if self.resilience.monitoring.request_logging {
            debug!("POST {}", url);
        }

        let request = self.request(Method::POST, url.clone(), cancel).await?.json(body);
        let response = cancellable(cancel, &url, request.send())
            .await?
            .with_context(|| format!("POST {} failed", url))?;
        let response = self.check_status(Method::POST, &url, response).await?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from POST {}", url))
    }

    async fn delete(&self, collection: &str, id: Uuid, cancel: &CancellationToken) -> Result<()> {
        let url = self.entity_url(collection, id)?;
        if self.resilience.monitoring.request_logging {
            debug!("DELETE {}", url);
        }

        let request = self.request(Method::DELETE, url.clone(), cancel).await?;
        let response = cancellable(cancel, &url, request.send())
            .await?
            .with_context(|| format!("DELETE {} failed", url))?;
        self.check_status(Method::DELETE, &url, response).await?;

        Ok(())
    }

    /// Turn non-2xx responses into errors carrying status and body
    async fn check_status(
        &self,
        method: Method,
        url: &Url,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = if self.resilience.monitoring.error_bodies {
            response.text().await.unwrap_or_default()
        } else {
            String::new()
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => anyhow::bail!(
                "{} {} was rejected ({}), check the client credentials: {}",
                method,
                url,
                status,
                body.trim()
            ),
            _ => anyhow::bail!("{} {} returned {}: {}", method, url, status, body.trim()),
        }
    }
}

#[async_trait]
impl AuthzClient for AuthzHttpClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list_object_types(&self, cancel: &CancellationToken) -> Result<Vec<ObjectType>> {
        self.get_all(OBJECT_TYPES, cancel).await
    }

    async fn list_edge_types(&self, cancel: &CancellationToken) -> Result<Vec<EdgeType>> {
        self.get_all(EDGE_TYPES, cancel).await
    }

    async fn list_objects(&self, cursor: &Cursor, cancel: &CancellationToken) -> Result<Page<Object>> {
        self.get_page(OBJECTS, cursor, cancel).await
    }

    async fn list_edges(&self, cursor: &Cursor, cancel: &CancellationToken) -> Result<Page<Edge>> {
        self.get_page(EDGES, cursor, cancel).await
    }

    async fn create_object_type(
        &self,
        id: Uuid,
        type_name: &str,
        cancel: &CancellationToken,
    ) -> Result<ObjectType> {
        let body = json!({ "object_type": ObjectType { id, type_name: type_name.to_string() } });
        self.post(OBJECT_TYPES, &body, cancel).await
    }

    async fn create_object(
        &self,
        id: Uuid,
        type_id: Uuid,
        alias: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Object> {
        let object = Object {
            id,
            type_id,
            alias: alias.map(str::to_string),
        };
        self.post(OBJECTS, &json!({ "object": object }), cancel).await
    }

    async fn create_edge_type(
        &self,
        id: Uuid,
        source_object_type_id: Uuid,
        target_object_type_id: Uuid,
        type_name: &str,
        attributes: &[Attribute],
        cancel: &CancellationToken,
    ) -> Result<EdgeType> {
        let edge_type = EdgeType {
            id,
            type_name: type_name.to_string(),
            source_object_type_id,
            target_object_type_id,
            attributes: attributes.to_vec(),
        };
        self.post(EDGE_TYPES, &json!({ "edge_type": edge_type }), cancel).await
    }

    async fn create_edge(
        &self,
        id: Uuid,
        source_object_id: Uuid,
        target_object_id: Uuid,
        edge_type_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Edge> {
        let edge = Edge {
            id,
            edge_type_id,
            source_object_id,
            target_object_id,
        };
        self.post(EDGES, &json!({ "edge": edge }), cancel).await
    }

    async fn delete_object_type(&self, id: Uuid, cancel: &CancellationToken) -> Result<()> {
        self.delete(OBJECT_TYPES, id, cancel).await
    }

    async fn delete_object(&self, id: Uuid, cancel: &CancellationToken) -> Result<()> {
        self.delete(OBJECTS, id, cancel).await
    }

    async fn delete_edge_type(&self, id: Uuid, cancel: &CancellationToken) -> Result<()> {
        self.delete(EDGE_TYPES, id, cancel).await
    }

    async fn delete_edge(&self, id: Uuid, cancel: &CancellationToken) -> Result<()> {
        self.delete(EDGES, id, cancel).await
    }
}

/// Parse a tenant URL and make sure it ends with a slash so relative joins keep its path
pub fn normalize_base_url(tenant_url: &str) -> Result<Url> {
    let trimmed = tenant_url.trim();
    if trimmed.is_empty() {
        anyhow::bail!("Tenant URL is empty");
    }

    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };

    let url = Url::parse(&with_slash).with_context(|| format!("Invalid tenant URL: {}", tenant_url))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => anyhow::bail!("Unsupported URL scheme '{}' in {}", other, tenant_url),
    }
}

/// Race a request against the cancellation token
async fn cancellable<F, T>(cancel: &CancellationToken, url: &Url, fut: F) -> Result<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        _ = cancel.cancelled() => anyhow::bail!("Request to {} cancelled", url),
        out = fut => Ok(out),
    }
}

async fn sleep_cancellable(cancel: &CancellationToken, wait: std::time::Duration) -> Result<()> {
    tokio::select! {
        _ = cancel.cancelled() => anyhow::bail!("Cancelled while waiting to retry"),
        _ = tokio::time::sleep(wait) => Ok(()),
    }
}

/// Seconds from a Retry-After header, if present and numeric
fn retry_after(response: &reqwest::Response) -> Option<std::time::Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(std::time::Duration::from_secs)
}
