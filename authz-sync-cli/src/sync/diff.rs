//! One-directional set difference between two snapshots
//!
//! `diff(a, b)` keeps every entity of `a` that `b` lacks by id, or holds in a
//! different form. Entities changed on either side therefore show up in both
//! the deletion and the insertion set: the old form is removed and the new
//! one recreated under the same id.

use std::collections::HashMap;

use uuid::Uuid;

use super::resources::{ChangeSet, Resource, ResourceSet, Snapshot};

/// Entities of one kind in `a` that are missing from `b` or differ in content.
/// Output follows `a`'s order.
pub fn diff_kind<R: Resource>(a: &[R], b: &[R]) -> Vec<R> {
    let by_id: HashMap<Uuid, &R> = b.iter().map(|r| (r.id(), r)).collect();

    a.iter()
        .filter(|item| match by_id.get(&item.id()) {
            Some(other) => !item.equals_ignoring_id(other),
            None => true,
        })
        .cloned()
        .collect()
}

/// Per-kind difference of two resource sets
pub fn diff(a: &ResourceSet, b: &ResourceSet) -> ResourceSet {
    ResourceSet {
        object_types: diff_kind(&a.object_types, &b.object_types),
        objects: diff_kind(&a.objects, &b.objects),
        edge_types: diff_kind(&a.edge_types, &b.edge_types),
        edges: diff_kind(&a.edges, &b.edges),
    }
}

/// What the destination is missing
pub fn insertions(source: &Snapshot, destination: &Snapshot) -> ChangeSet {
    diff(source, destination)
}

/// What the destination has that the source does not
pub fn deletions(source: &Snapshot, destination: &Snapshot) -> ChangeSet {
    diff(destination, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{Attribute, Edge, EdgeType, Object, ObjectType};

    fn object_type(id: u128, name: &str) -> ObjectType {
        ObjectType {
            id: Uuid::from_u128(id),
            type_name: name.to_string(),
        }
    }

    fn object(id: u128, type_id: u128, alias: Option<&str>) -> Object {
        Object {
            id: Uuid::from_u128(id),
            type_id: Uuid::from_u128(type_id),
            alias: alias.map(str::to_string),
        }
    }

    #[test]
    fn test_identical_sets_have_no_diff() {
        let set = ResourceSet {
            object_types: vec![object_type(1, "user")],
            objects: vec![object(10, 1, Some("alice"))],
            edge_types: vec![EdgeType {
                id: Uuid::from_u128(20),
                type_name: "friend".to_string(),
                source_object_type_id: Uuid::from_u128(1),
                target_object_type_id: Uuid::from_u128(1),
                attributes: vec![Attribute::direct("view")],
            }],
            edges: vec![Edge {
                id: Uuid::from_u128(30),
                edge_type_id: Uuid::from_u128(20),
                source_object_id: Uuid::from_u128(10),
                target_object_id: Uuid::from_u128(10),
            }],
        };

        assert!(diff(&set, &set).is_empty());
    }

    #[test]
    fn test_diff_is_asymmetric() {
        let a = vec![object_type(1, "user"), object_type(2, "group")];
        let b = vec![object_type(1, "user"), object_type(3, "service")];

        assert_eq!(diff_kind(&a, &b), vec![object_type(2, "group")]);
        assert_eq!(diff_kind(&b, &a), vec![object_type(3, "service")]);
    }

    #[test]
    fn test_changed_entity_appears_in_both_directions() {
        let source = ResourceSet {
            objects: vec![object(10, 1, Some("alice"))],
            ..Default::default()
        };
        let destination = ResourceSet {
            objects: vec![object(10, 1, Some("alicia"))],
            ..Default::default()
        };

        assert_eq!(insertions(&source, &destination).objects, source.objects);
        assert_eq!(deletions(&source, &destination).objects, destination.objects);
    }

    #[test]
    fn test_same_content_different_id_is_not_a_match() {
        let a = vec![object_type(1, "user")];
        let b = vec![object_type(2, "user")];
        assert_eq!(diff_kind(&a, &b).len(), 1);
    }

    #[test]
    fn test_diff_preserves_source_order() {
        let a = vec![
            object_type(5, "e"),
            object_type(1, "a"),
            object_type(3, "c"),
            object_type(2, "b"),
        ];
        let b = vec![object_type(1, "a")];

        let ids: Vec<_> = diff_kind(&a, &b).iter().map(|t| t.id).collect();
        assert_eq!(
            ids,
            vec![Uuid::from_u128(5), Uuid::from_u128(3), Uuid::from_u128(2)]
        );
    }

    #[test]
    fn test_alias_null_versus_empty_is_a_change() {
        let a = vec![object(10, 1, None)];
        let b = vec![object(10, 1, Some(""))];
        assert_eq!(diff_kind(&a, &b), a);
    }
}
