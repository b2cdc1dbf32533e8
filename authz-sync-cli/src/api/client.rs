//! Client contract for one authorization service instance
//!
//! The sync engine only talks to tenants through this trait. The production
//! implementation is [`super::AuthzHttpClient`]; tests use an in-memory fake.

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::models::{Attribute, Edge, EdgeType, Object, ObjectType};
use super::pagination::{Cursor, Page};

/// Read and mutation calls against one tenant's authorization graph.
///
/// Every call takes a cancellation token; a cancelled call returns an error.
/// Create calls pass the caller's identifier so identity is preserved across
/// environments.
#[async_trait]
pub trait AuthzClient: Send + Sync {
    /// Human-readable endpoint description (used in logs and errors)
    fn endpoint(&self) -> &str;

    async fn list_object_types(&self, cancel: &CancellationToken) -> Result<Vec<ObjectType>>;

    async fn list_edge_types(&self, cancel: &CancellationToken) -> Result<Vec<EdgeType>>;

    async fn list_objects(&self, cursor: &Cursor, cancel: &CancellationToken) -> Result<Page<Object>>;

    async fn list_edges(&self, cursor: &Cursor, cancel: &CancellationToken) -> Result<Page<Edge>>;

    async fn create_object_type(
        &self,
        id: Uuid,
        type_name: &str,
        cancel: &CancellationToken,
    ) -> Result<ObjectType>;

    async fn create_object(
        &self,
        id: Uuid,
        type_id: Uuid,
        alias: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Object>;

    async fn create_edge_type(
        &self,
        id: Uuid,
        source_object_type_id: Uuid,
        target_object_type_id: Uuid,
        type_name: &str,
        attributes: &[Attribute],
        cancel: &CancellationToken,
    ) -> Result<EdgeType>;

    async fn create_edge(
        &self,
        id: Uuid,
        source_object_id: Uuid,
        target_object_id: Uuid,
        edge_type_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Edge>;

    async fn delete_object_type(&self, id: Uuid, cancel: &CancellationToken) -> Result<()>;

    async fn delete_object(&self, id: Uuid, cancel: &CancellationToken) -> Result<()>;

    async fn delete_edge_type(&self, id: Uuid, cancel: &CancellationToken) -> Result<()>;

    async fn delete_edge(&self, id: Uuid, cancel: &CancellationToken) -> Result<()>;
}
