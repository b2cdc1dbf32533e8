//! Sync orchestration
//!
//! One run walks: fetch source, fetch destination, deletions (unless
//! insert-only), insertions. Dry-run computes both change-sets but applies
//! neither. The first failing phase ends the run.

use std::fmt;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::info;
use tokio_util::sync::CancellationToken;

use super::apply::{Applier, FailureMode};
use super::diff;
use super::fetch::fetch_snapshot;
use super::progress::SyncProgress;
use super::resources::{ResourceCounts, ResourceKind};
use crate::api::AuthzClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    FetchSource,
    FetchDestination,
    Delete,
    Insert,
}

impl SyncPhase {
    pub fn title(&self) -> &'static str {
        match self {
            SyncPhase::FetchSource => "Fetching source",
            SyncPhase::FetchDestination => "Fetching destination",
            SyncPhase::Delete => "Deletion phase",
            SyncPhase::Insert => "Insertion phase",
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            SyncPhase::FetchSource | SyncPhase::FetchDestination => "fetch",
            SyncPhase::Delete => "deletions",
            SyncPhase::Insert => "insertions",
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            SyncPhase::FetchSource | SyncPhase::FetchDestination => "Fetching",
            SyncPhase::Delete => "Deleting",
            SyncPhase::Insert => "Inserting",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            SyncPhase::FetchSource | SyncPhase::FetchDestination => "Fetched",
            SyncPhase::Delete => "Deleted",
            SyncPhase::Insert => "Inserted",
        }
    }

    /// Kind order in which this phase touches entities
    pub fn order(&self) -> [ResourceKind; 4] {
        match self {
            SyncPhase::Delete => ResourceKind::DELETE_ORDER,
            _ => ResourceKind::INSERT_ORDER,
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Behaviour switches for one run. The flags are independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Compute and report, never mutate
    pub dry_run: bool,
    /// Skip the deletion phase entirely, including its diff
    pub insert_only: bool,
    pub failure_mode: FailureMode,
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub source_endpoint: String,
    pub destination_endpoint: String,
    pub source: ResourceCounts,
    pub destination: ResourceCounts,
    /// Planned deletions; `None` when insert-only
    pub deletions: Option<ResourceCounts>,
    pub insertions: ResourceCounts,
    pub deleted: ResourceCounts,
    pub inserted: ResourceCounts,
    pub dry_run: bool,
    pub insert_only: bool,
    pub duration: Duration,
}

/// Reconciles a destination tenant with a source tenant
pub struct SyncEngine<'a> {
    source: &'a dyn AuthzClient,
    destination: &'a dyn AuthzClient,
    progress: &'a dyn SyncProgress,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        source: &'a dyn AuthzClient,
        destination: &'a dyn AuthzClient,
        progress: &'a dyn SyncProgress,
    ) -> Self {
        Self {
            source,
            destination,
            progress,
        }
    }

    pub async fn run(&self, options: SyncOptions, cancel: &CancellationToken) -> Result<SyncReport> {
        let started = Instant::now();
        info!(
            "Syncing {} -> {} (dry_run={}, insert_only={}, mode={:?})",
            self.source.endpoint(),
            self.destination.endpoint(),
            options.dry_run,
            options.insert_only,
            options.failure_mode
        );

        self.progress
            .phase_started(SyncPhase::FetchSource, self.source.endpoint());
        let source = fetch_snapshot(self.source, self.progress, cancel)
            .await
            .context("Fetching source snapshot failed")?;

        self.progress
            .phase_started(SyncPhase::FetchDestination, self.destination.endpoint());
        let destination = fetch_snapshot(self.destination, self.progress, cancel)
            .await
            .context("Fetching destination snapshot failed")?;

        let applier = Applier::new(self.destination, self.progress, options.failure_mode, cancel);

        let mut report = SyncReport {
            source_endpoint: self.source.endpoint().to_string(),
            destination_endpoint: self.destination.endpoint().to_string(),
            source: source.counts(),
            destination: destination.counts(),
            deletions: None,
            insertions: ResourceCounts::default(),
            deleted: ResourceCounts::default(),
            inserted: ResourceCounts::default(),
            dry_run: options.dry_run,
            insert_only: options.insert_only,
            duration: Duration::ZERO,
        };

        if !options.insert_only {
            self.progress
                .phase_started(SyncPhase::Delete, self.destination.endpoint());
            let deletions = diff::deletions(&source, &destination);
            self.progress
                .changes_computed(SyncPhase::Delete, &deletions.counts());
            report.deletions = Some(deletions.counts());

            if options.dry_run {
                self.progress.phase_skipped(SyncPhase::Delete, "dry run");
            } else if deletions.is_empty() {
                self.progress.phase_skipped(SyncPhase::Delete, "nothing to delete");
            } else {
                report.deleted = applier
                    .delete(&deletions)
                    .await
                    .with_context(|| format!("Deletion phase failed on {}", self.destination.endpoint()))?;
            }
        }

        self.progress
            .phase_started(SyncPhase::Insert, self.destination.endpoint());
        let insertions = diff::insertions(&source, &destination);
        self.progress
            .changes_computed(SyncPhase::Insert, &insertions.counts());
        report.insertions = insertions.counts();

        if options.dry_run {
            self.progress.phase_skipped(SyncPhase::Insert, "dry run");
        } else if insertions.is_empty() {
            self.progress.phase_skipped(SyncPhase::Insert, "nothing to insert");
        } else {
            report.inserted = applier
                .insert(&insertions)
                .await
                .with_context(|| format!("Insertion phase failed on {}", self.destination.endpoint()))?;
        }

        report.duration = started.elapsed();
        self.progress.finished(&report);
        info!("Sync finished in {:.2}s", report.duration.as_secs_f64());

        Ok(report)
    }
}
