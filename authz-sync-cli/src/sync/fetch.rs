//! Snapshot fetching

use std::future::Future;

use anyhow::{Context, Result};
use log::debug;
use tokio_util::sync::CancellationToken;

use super::progress::SyncProgress;
use super::resources::{ResourceKind, Snapshot};
use crate::api::pagination::CursorTrail;
use crate::api::{AuthzClient, Cursor, Page};

/// Read all four kinds from `client`. Any failure aborts the whole fetch.
pub async fn fetch_snapshot(
    client: &dyn AuthzClient,
    progress: &dyn SyncProgress,
    cancel: &CancellationToken,
) -> Result<Snapshot> {
    let endpoint = client.endpoint();

    let object_types = client
        .list_object_types(cancel)
        .await
        .with_context(|| format!("Failed to list object types from {}", endpoint))?;
    progress.kind_fetched(ResourceKind::ObjectType, object_types.len());

    let objects = collect_pages(ResourceKind::Object, move |cursor| async move {
        client.list_objects(&cursor, cancel).await
    })
    .await
    .with_context(|| format!("Failed to list objects from {}", endpoint))?;
    progress.kind_fetched(ResourceKind::Object, objects.len());

    let edge_types = client
        .list_edge_types(cancel)
        .await
        .with_context(|| format!("Failed to list edge types from {}", endpoint))?;
    progress.kind_fetched(ResourceKind::EdgeType, edge_types.len());

    let edges = collect_pages(ResourceKind::Edge, move |cursor| async move {
        client.list_edges(&cursor, cancel).await
    })
    .await
    .with_context(|| format!("Failed to list edges from {}", endpoint))?;
    progress.kind_fetched(ResourceKind::Edge, edges.len());

    Ok(Snapshot {
        object_types,
        objects,
        edge_types,
        edges,
    })
}

/// Follow a cursor-paginated collection from the beginning to the end
pub async fn collect_pages<T, F, Fut>(kind: ResourceKind, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(Cursor) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut all = Vec::new();
    let mut cursor = Cursor::begin();
    let mut trail = CursorTrail::new();
    let mut pages = 0usize;

    loop {
        let page = fetch_page(cursor.clone())
            .await
            .with_context(|| format!("Failed to fetch {} page after cursor {}", kind, cursor))?;
        pages += 1;
        all.extend(page.entities);

        if !page.has_next {
            break;
        }
        trail
            .advance(&page.next)
            .with_context(|| format!("Paging through {} stopped after cursor {}", kind.plural(), cursor))?;
        cursor = page.next;
    }

    debug!("Fetched {} {} in {} page(s)", all.len(), kind.plural(), pages);
    Ok(all)
}
