//! Dependency-ordered application of change-sets
//!
//! Insertions go parents first (object types, objects, edge types, edges),
//! deletions children first. One remote mutation per entity, each awaited
//! before the next. Nothing is rolled back: whatever was applied before a
//! failure stays applied.

use std::fmt;
use std::future::Future;

use anyhow::Result;
use log::debug;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::engine::SyncPhase;
use super::progress::SyncProgress;
use super::resources::{ChangeSet, Resource, ResourceCounts, ResourceKind};
use crate::api::models::{Edge, EdgeType, Object, ObjectType};
use crate::api::AuthzClient;

/// How a phase reacts to a failed mutation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureMode {
    /// Abort the phase at the first failure
    #[default]
    FailFast,
    /// Attempt every entity, then fail with all collected failures
    CollectErrors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOperation {
    Create,
    Delete,
}

impl fmt::Display for ApplyOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyOperation::Create => write!(f, "create"),
            ApplyOperation::Delete => write!(f, "delete"),
        }
    }
}

/// A single failed mutation
#[derive(Debug)]
pub struct ApplyError {
    pub operation: ApplyOperation,
    pub kind: ResourceKind,
    pub id: Uuid,
    pub label: String,
    pub endpoint: String,
    pub source: anyhow::Error,
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to {} {} {} ({}) on {}",
            self.operation, self.kind, self.label, self.id, self.endpoint
        )
    }
}

impl std::error::Error for ApplyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Every failure of a phase run in [`FailureMode::CollectErrors`]
#[derive(Debug)]
pub struct PhaseFailures {
    pub operation: ApplyOperation,
    pub attempted: usize,
    pub failures: Vec<ApplyError>,
}

impl fmt::Display for PhaseFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} {} operations failed",
            self.failures.len(),
            self.attempted,
            self.operation
        )?;
        for failure in &self.failures {
            write!(f, "\n  - {}: {:#}", failure, failure.source)?;
        }
        Ok(())
    }
}

impl std::error::Error for PhaseFailures {}

/// Applies change-sets to one destination
pub struct Applier<'a> {
    client: &'a dyn AuthzClient,
    progress: &'a dyn SyncProgress,
    mode: FailureMode,
    cancel: &'a CancellationToken,
}

impl<'a> Applier<'a> {
    pub fn new(
        client: &'a dyn AuthzClient,
        progress: &'a dyn SyncProgress,
        mode: FailureMode,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            client,
            progress,
            mode,
            cancel,
        }
    }

    /// Create every entity in `changes`, parents first. Returns what was created.
    pub async fn insert(&self, changes: &ChangeSet) -> Result<ResourceCounts> {
        let client = self.client;
        let cancel = self.cancel;
        let mut run = PhaseRun::new(ApplyOperation::Create);

        self.apply_kind(&mut run, &changes.object_types, move |t: ObjectType| async move {
            client.create_object_type(t.id, &t.type_name, cancel).await.map(|_| ())
        })
        .await?;

        self.apply_kind(&mut run, &changes.objects, move |o: Object| async move {
            client
                .create_object(o.id, o.type_id, o.alias.as_deref(), cancel)
                .await
                .map(|_| ())
        })
        .await?;

        self.apply_kind(&mut run, &changes.edge_types, move |et: EdgeType| async move {
            client
                .create_edge_type(
                    et.id,
                    et.source_object_type_id,
                    et.target_object_type_id,
                    &et.type_name,
                    &et.attributes,
                    cancel,
                )
                .await
                .map(|_| ())
        })
        .await?;

        self.apply_kind(&mut run, &changes.edges, move |e: Edge| async move {
            client
                .create_edge(e.id, e.source_object_id, e.target_object_id, e.edge_type_id, cancel)
                .await
                .map(|_| ())
        })
        .await?;

        run.finish()
    }

    /// Delete every entity in `changes`, children first. Returns what was deleted.
    pub async fn delete(&self, changes: &ChangeSet) -> Result<ResourceCounts> {
        let client = self.client;
        let cancel = self.cancel;
        let mut run = PhaseRun::new(ApplyOperation::Delete);

        self.apply_kind(&mut run, &changes.edges, move |e: Edge| async move {
            client.delete_edge(e.id, cancel).await
        })
        .await?;

        self.apply_kind(&mut run, &changes.edge_types, move |et: EdgeType| async move {
            client.delete_edge_type(et.id, cancel).await
        })
        .await?;

        self.apply_kind(&mut run, &changes.objects, move |o: Object| async move {
            client.delete_object(o.id, cancel).await
        })
        .await?;

        self.apply_kind(&mut run, &changes.object_types, move |t: ObjectType| async move {
            client.delete_object_type(t.id, cancel).await
        })
        .await?;

        run.finish()
    }

    /// Apply `mutate` to each item of one kind in order
    async fn apply_kind<R, F, Fut>(&self, run: &mut PhaseRun, items: &[R], mut mutate: F) -> Result<()>
    where
        R: Resource,
        F: FnMut(R) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        if items.is_empty() {
            return Ok(());
        }

        let phase = run.phase();
        let kind = R::KIND;
        self.progress.kind_started(phase, kind, items.len());

        let mut applied = 0;
        for item in items {
            if self.cancel.is_cancelled() {
                anyhow::bail!("{} interrupted: cancelled after {} {}", phase.title(), applied, kind.plural());
            }

            let label = item.label();
            run.attempted += 1;

            match mutate(item.clone()).await {
                Ok(()) => {
                    applied += 1;
                    debug!("{} {} {} ({})", phase.past_tense(), kind, label, item.id());
                    self.progress.entity_applied(phase, kind, &label);
                }
                Err(source) => {
                    self.progress.entity_failed(phase, kind, &label, &source);
                    let error = ApplyError {
                        operation: run.operation,
                        kind,
                        id: item.id(),
                        label,
                        endpoint: self.client.endpoint().to_string(),
                        source,
                    };

                    match self.mode {
                        FailureMode::FailFast => {
                            self.progress.kind_finished(phase, kind, applied, items.len());
                            return Err(error.into());
                        }
                        FailureMode::CollectErrors => run.failures.push(error),
                    }
                }
            }
        }

        self.progress.kind_finished(phase, kind, applied, items.len());
        run.applied.set(kind, applied);
        Ok(())
    }
}

/// Bookkeeping for one insert or delete pass
struct PhaseRun {
    operation: ApplyOperation,
    attempted: usize,
    applied: ResourceCounts,
    failures: Vec<ApplyError>,
}

impl PhaseRun {
    fn new(operation: ApplyOperation) -> Self {
        Self {
            operation,
            attempted: 0,
            applied: ResourceCounts::default(),
            failures: Vec::new(),
        }
    }

    fn phase(&self) -> SyncPhase {
        match self.operation {
            ApplyOperation::Create => SyncPhase::Insert,
            ApplyOperation::Delete => SyncPhase::Delete,
        }
    }

    fn finish(self) -> Result<ResourceCounts> {
        if self.failures.is_empty() {
            Ok(self.applied)
        } else {
            Err(PhaseFailures {
                operation: self.operation,
                attempted: self.attempted,
                failures: self.failures,
            }
            .into())
        }
    }
}
