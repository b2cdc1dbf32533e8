//! In-memory tenant used by engine tests
//!
//! Records every mutation in call order and enforces the same referential
//! rules as the real service, so a mis-ordered change-set fails loudly.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::engine::{SyncPhase, SyncReport};
use super::progress::SyncProgress;
use super::resources::{ResourceCounts, ResourceKind, ResourceSet};
use crate::api::models::{Attribute, Edge, EdgeType, Object, ObjectType};
use crate::api::{AuthzClient, Cursor, Page};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateObjectType(Uuid),
    CreateObject(Uuid),
    CreateEdgeType(Uuid),
    CreateEdge(Uuid),
    DeleteObjectType(Uuid),
    DeleteObject(Uuid),
    DeleteEdgeType(Uuid),
    DeleteEdge(Uuid),
}

impl Call {
    pub fn is_delete(&self) -> bool {
        matches!(
            self,
            Call::DeleteObjectType(_) | Call::DeleteObject(_) | Call::DeleteEdgeType(_) | Call::DeleteEdge(_)
        )
    }
}

pub struct FakeClient {
    endpoint: String,
    page_size: usize,
    state: Mutex<ResourceSet>,
    calls: Mutex<Vec<Call>>,
    failing_ids: Mutex<HashSet<Uuid>>,
    failing_lists: Mutex<HashSet<ResourceKind>>,
    object_pages: AtomicUsize,
}

impl FakeClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            page_size: 100,
            state: Mutex::new(ResourceSet::default()),
            calls: Mutex::new(Vec::new()),
            failing_ids: Mutex::new(HashSet::new()),
            failing_lists: Mutex::new(HashSet::new()),
            object_pages: AtomicUsize::new(0),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn seed(&self, set: ResourceSet) {
        *self.state.lock().unwrap() = set;
    }

    pub fn seed_object_types(&self, object_types: Vec<ObjectType>) {
        self.state.lock().unwrap().object_types = object_types;
    }

    pub fn seed_objects(&self, objects: Vec<Object>) {
        self.state.lock().unwrap().objects = objects;
    }

    pub fn state(&self) -> ResourceSet {
        self.state.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Make any mutation on `id` fail
    pub fn fail_mutation(&self, id: Uuid) {
        self.failing_ids.lock().unwrap().insert(id);
    }

    pub fn fail_listing(&self, kind: ResourceKind) {
        self.failing_lists.lock().unwrap().insert(kind);
    }

    /// Number of object pages served so far
    pub fn list_object_pages(&self) -> usize {
        self.object_pages.load(Ordering::SeqCst)
    }

    fn check_list(&self, kind: ResourceKind, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            anyhow::bail!("cancelled");
        }
        if self.failing_lists.lock().unwrap().contains(&kind) {
            anyhow::bail!("listing {} failed", kind.plural());
        }
        Ok(())
    }

    fn record(&self, call: Call, id: Uuid, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            anyhow::bail!("cancelled");
        }
        self.calls.lock().unwrap().push(call);
        if self.failing_ids.lock().unwrap().contains(&id) {
            anyhow::bail!("injected failure for {}", id);
        }
        Ok(())
    }

    fn page<T: Clone>(&self, items: &[T], cursor: &Cursor) -> Result<Page<T>> {
        let start: usize = if cursor.is_begin() {
            0
        } else {
            cursor.as_str().parse()?
        };
        let end = (start + self.page_size).min(items.len());
        let entities = items[start.min(end)..end].to_vec();

        Ok(if end < items.len() {
            Page::with_next(entities, Cursor::new(end.to_string()))
        } else {
            Page::last(entities)
        })
    }
}

#[async_trait]
impl AuthzClient for FakeClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list_object_types(&self, cancel: &CancellationToken) -> Result<Vec<ObjectType>> {
        self.check_list(ResourceKind::ObjectType, cancel)?;
        Ok(self.state.lock().unwrap().object_types.clone())
    }

    async fn list_edge_types(&self, cancel: &CancellationToken) -> Result<Vec<EdgeType>> {
        self.check_list(ResourceKind::EdgeType, cancel)?;
        Ok(self.state.lock().unwrap().edge_types.clone())
    }

    async fn list_objects(&self, cursor: &Cursor, cancel: &CancellationToken) -> Result<Page<Object>> {
        self.check_list(ResourceKind::Object, cancel)?;
        self.object_pages.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        self.page(&state.objects, cursor)
    }

    async fn list_edges(&self, cursor: &Cursor, cancel: &CancellationToken) -> Result<Page<Edge>> {
        self.check_list(ResourceKind::Edge, cancel)?;
        let state = self.state.lock().unwrap();
        self.page(&state.edges, cursor)
    }

    async fn create_object_type(
        &self,
        id: Uuid,
        type_name: &str,
        cancel: &CancellationToken,
    ) -> Result<ObjectType> {
        self.record(Call::CreateObjectType(id), id, cancel)?;
        let mut state = self.state.lock().unwrap();
        if state.object_types.iter().any(|t| t.id == id || t.type_name == type_name) {
            anyhow::bail!("object type {} already exists", type_name);
        }
        let created = ObjectType {
            id,
            type_name: type_name.to_string(),
        };
        state.object_types.push(created.clone());
        Ok(created)
    }

    async fn create_object(
        &self,
        id: Uuid,
        type_id: Uuid,
        alias: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Object> {
        self.record(Call::CreateObject(id), id, cancel)?;
        let mut state = self.state.lock().unwrap();
        if !state.object_types.iter().any(|t| t.id == type_id) {
            anyhow::bail!("object type {} does not exist", type_id);
        }
        if state.objects.iter().any(|o| {
            o.id == id || (alias.is_some() && o.type_id == type_id && o.alias.as_deref() == alias)
        }) {
            anyhow::bail!("object {} conflicts with an existing object", id);
        }
        let created = Object {
            id,
            type_id,
            alias: alias.map(str::to_string),
        };
        state.objects.push(created.clone());
        Ok(created)
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
        self.record(Call::CreateEdgeType(id), id, cancel)?;
        let mut state = self.state.lock().unwrap();
        for type_id in [source_object_type_id, target_object_type_id] {
            if !state.object_types.iter().any(|t| t.id == type_id) {
                anyhow::bail!("object type {} does not exist", type_id);
            }
        }
        if state.edge_types.iter().any(|t| t.id == id) {
            anyhow::bail!("edge type {} already exists", id);
        }
        let created = EdgeType {
            id,
            type_name: type_name.to_string(),
            source_object_type_id,
            target_object_type_id,
            attributes: attributes.to_vec(),
        };
        state.edge_types.push(created.clone());
        Ok(created)
    }

    async fn create_edge(
        &self,
        id: Uuid,
        source_object_id: Uuid,
        target_object_id: Uuid,
        edge_type_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Edge> {
        self.record(Call::CreateEdge(id), id, cancel)?;
        let mut state = self.state.lock().unwrap();
        if !state.edge_types.iter().any(|t| t.id == edge_type_id) {
            anyhow::bail!("edge type {} does not exist", edge_type_id);
        }
        for object_id in [source_object_id, target_object_id] {
            if !state.objects.iter().any(|o| o.id == object_id) {
                anyhow::bail!("object {} does not exist", object_id);
            }
        }
        if state.edges.iter().any(|e| e.id == id) {
            anyhow::bail!("edge {} already exists", id);
        }
        let created = Edge {
            id,
            edge_type_id,
            source_object_id,
            target_object_id,
        };
        state.edges.push(created.clone());
        Ok(created)
    }

    async fn delete_object_type(&self, id: Uuid, cancel: &CancellationToken) -> Result<()> {
        self.record(Call::DeleteObjectType(id), id, cancel)?;
        let mut state = self.state.lock().unwrap();
        if state.objects.iter().any(|o| o.type_id == id) {
            anyhow::bail!("object type {} still has objects", id);
        }
        if state
            .edge_types
            .iter()
            .any(|t| t.source_object_type_id == id || t.target_object_type_id == id)
        {
            anyhow::bail!("object type {} still has edge types", id);
        }
        remove_by_id(&mut state.object_types, id, |t| t.id)
    }

    async fn delete_object(&self, id: Uuid, cancel: &CancellationToken) -> Result<()> {
        self.record(Call::DeleteObject(id), id, cancel)?;
        let mut state = self.state.lock().unwrap();
        if state
            .edges
            .iter()
            .any(|e| e.source_object_id == id || e.target_object_id == id)
        {
            anyhow::bail!("object {} still has edges", id);
        }
        remove_by_id(&mut state.objects, id, |o| o.id)
    }

    async fn delete_edge_type(&self, id: Uuid, cancel: &CancellationToken) -> Result<()> {
        self.record(Call::DeleteEdgeType(id), id, cancel)?;
        let mut state = self.state.lock().unwrap();
        if state.edges.iter().any(|e| e.edge_type_id == id) {
            anyhow::bail!("edge type {} still has edges", id);
        }
        remove_by_id(&mut state.edge_types, id, |t| t.id)
    }

    async fn delete_edge(&self, id: Uuid, cancel: &CancellationToken) -> Result<()> {
        self.record(Call::DeleteEdge(id), id, cancel)?;
        let mut state = self.state.lock().unwrap();
        remove_by_id(&mut state.edges, id, |e| e.id)
    }
}

fn remove_by_id<T>(items: &mut Vec<T>, id: Uuid, id_of: impl Fn(&T) -> Uuid) -> Result<()> {
    let before = items.len();
    items.retain(|item| id_of(item) != id);
    if items.len() == before {
        anyhow::bail!("{} not found", id);
    }
    Ok(())
}

/// Progress sink that ignores everything
pub struct NoopProgress;

impl SyncProgress for NoopProgress {
    fn phase_started(&self, _phase: SyncPhase, _endpoint: &str) {}
    fn kind_fetched(&self, _kind: ResourceKind, _count: usize) {}
    fn changes_computed(&self, _phase: SyncPhase, _changes: &ResourceCounts) {}
    fn phase_skipped(&self, _phase: SyncPhase, _reason: &str) {}
    fn kind_started(&self, _phase: SyncPhase, _kind: ResourceKind, _total: usize) {}
    fn entity_applied(&self, _phase: SyncPhase, _kind: ResourceKind, _label: &str) {}
    fn entity_failed(&self, _phase: SyncPhase, _kind: ResourceKind, _label: &str, _error: &anyhow::Error) {}
    fn kind_finished(&self, _phase: SyncPhase, _kind: ResourceKind, _applied: usize, _total: usize) {}
    fn finished(&self, _report: &SyncReport) {}
}

pub fn object_type(id: u128, name: &str) -> ObjectType {
    ObjectType {
        id: Uuid::from_u128(id),
        type_name: name.to_string(),
    }
}

pub fn object(id: u128, type_id: u128, alias: Option<&str>) -> Object {
    Object {
        id: Uuid::from_u128(id),
        type_id: Uuid::from_u128(type_id),
        alias: alias.map(str::to_string),
    }
}

pub fn edge_type(id: u128, name: &str, source_type: u128, target_type: u128) -> EdgeType {
    EdgeType {
        id: Uuid::from_u128(id),
        type_name: name.to_string(),
        source_object_type_id: Uuid::from_u128(source_type),
        target_object_type_id: Uuid::from_u128(target_type),
        attributes: vec![Attribute::direct("read")],
    }
}

pub fn edge(id: u128, edge_type_id: u128, source: u128, target: u128) -> Edge {
    Edge {
        id: Uuid::from_u128(id),
        edge_type_id: Uuid::from_u128(edge_type_id),
        source_object_id: Uuid::from_u128(source),
        target_object_id: Uuid::from_u128(target),
    }
}
