//! Resource model shared by the fetcher, differ and applier
//!
//! Each entity kind carries its own content-equality rule. Identity is the
//! entity id alone and is never recomputed.

use std::collections::BTreeSet;
use std::fmt;

use uuid::Uuid;

use crate::api::models::{Edge, EdgeType, Object, ObjectType};

/// The four authorization graph entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ObjectType,
    Object,
    EdgeType,
    Edge,
}

impl ResourceKind {
    /// Parents before children
    pub const INSERT_ORDER: [ResourceKind; 4] = [
        ResourceKind::ObjectType,
        ResourceKind::Object,
        ResourceKind::EdgeType,
        ResourceKind::Edge,
    ];

    /// Children before parents
    pub const DELETE_ORDER: [ResourceKind; 4] = [
        ResourceKind::Edge,
        ResourceKind::EdgeType,
        ResourceKind::Object,
        ResourceKind::ObjectType,
    ];

    pub fn singular(&self) -> &'static str {
        match self {
            ResourceKind::ObjectType => "object type",
            ResourceKind::Object => "object",
            ResourceKind::EdgeType => "edge type",
            ResourceKind::Edge => "edge",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::ObjectType => "object types",
            ResourceKind::Object => "objects",
            ResourceKind::EdgeType => "edge types",
            ResourceKind::Edge => "edges",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

/// Per-kind identity and equality contract
pub trait Resource: Clone + Send + Sync {
    const KIND: ResourceKind;

    fn id(&self) -> Uuid;

    /// Every field other than the id is equal
    fn equals_ignoring_id(&self, other: &Self) -> bool;

    /// Short human label for progress output and errors
    fn label(&self) -> String;
}

impl Resource for ObjectType {
    const KIND: ResourceKind = ResourceKind::ObjectType;

    fn id(&self) -> Uuid {
        self.id
    }

    fn equals_ignoring_id(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }

    fn label(&self) -> String {
        format!("'{}'", self.type_name)
    }
}

impl Resource for Object {
    const KIND: ResourceKind = ResourceKind::Object;

    fn id(&self) -> Uuid {
        self.id
    }

    fn equals_ignoring_id(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.alias == other.alias
    }

    fn label(&self) -> String {
        match self.alias.as_deref() {
            Some(alias) if !alias.is_empty() => format!("'{}'", alias),
            _ => self.id.to_string(),
        }
    }
}

impl Resource for EdgeType {
    const KIND: ResourceKind = ResourceKind::EdgeType;

    fn id(&self) -> Uuid {
        self.id
    }

    fn equals_ignoring_id(&self, other: &Self) -> bool {
        // attributes are a set: order and repetition do not matter
        let ours: BTreeSet<_> = self.attributes.iter().collect();
        let theirs: BTreeSet<_> = other.attributes.iter().collect();

        self.type_name == other.type_name
            && self.source_object_type_id == other.source_object_type_id
            && self.target_object_type_id == other.target_object_type_id
            && ours == theirs
    }

    fn label(&self) -> String {
        format!("'{}'", self.type_name)
    }
}

impl Resource for Edge {
    const KIND: ResourceKind = ResourceKind::Edge;

    fn id(&self) -> Uuid {
        self.id
    }

    fn equals_ignoring_id(&self, other: &Self) -> bool {
        self.edge_type_id == other.edge_type_id
            && self.source_object_id == other.source_object_id
            && self.target_object_id == other.target_object_id
    }

    fn label(&self) -> String {
        format!("{} -> {}", self.source_object_id, self.target_object_id)
    }
}

/// All four kinds in iteration order. Used both as a snapshot of one tenant
/// and as a change-set of entities to insert or delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSet {
    pub object_types: Vec<ObjectType>,
    pub objects: Vec<Object>,
    pub edge_types: Vec<EdgeType>,
    pub edges: Vec<Edge>,
}

/// Everything read from one tenant at one time
pub type Snapshot = ResourceSet;

/// Entities slated for insertion into or deletion from a destination
pub type ChangeSet = ResourceSet;

impl ResourceSet {
    pub fn is_empty(&self) -> bool {
        self.counts().total() == 0
    }

    pub fn counts(&self) -> ResourceCounts {
        ResourceCounts {
            object_types: self.object_types.len(),
            objects: self.objects.len(),
            edge_types: self.edge_types.len(),
            edges: self.edges.len(),
        }
    }
}

/// Number of entities per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub object_types: usize,
    pub objects: usize,
    pub edge_types: usize,
    pub edges: usize,
}

impl ResourceCounts {
    pub fn get(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::ObjectType => self.object_types,
            ResourceKind::Object => self.objects,
            ResourceKind::EdgeType => self.edge_types,
            ResourceKind::Edge => self.edges,
        }
    }

    pub fn set(&mut self, kind: ResourceKind, count: usize) {
        match kind {
            ResourceKind::ObjectType => self.object_types = count,
            ResourceKind::Object => self.objects = count,
            ResourceKind::EdgeType => self.edge_types = count,
            ResourceKind::Edge => self.edges = count,
        }
    }

    pub fn total(&self) -> usize {
        self.object_types + self.objects + self.edge_types + self.edges
    }
}

impl fmt::Display for ResourceCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = ResourceKind::INSERT_ORDER
            .iter()
            .map(|kind| format!("{} {}", self.get(*kind), kind.plural()))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}
