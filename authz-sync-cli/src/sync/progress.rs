//! Progress reporting for sync runs
//!
//! The engine reports through [`SyncProgress`]. [`ConsoleProgress`] prints a
//! coloured summary for interactive use, [`LogProgress`] routes everything to
//! the `log` facade when stdout is not a terminal.

use colored::*;
use log::{debug, info, warn};

use super::engine::{SyncPhase, SyncReport};
use super::resources::{ResourceCounts, ResourceKind};

/// Observer for sync progress. All callbacks are synchronous and cheap.
pub trait SyncProgress: Send + Sync {
    fn phase_started(&self, phase: SyncPhase, endpoint: &str);

    fn kind_fetched(&self, kind: ResourceKind, count: usize);

    /// Size of a computed change-set
    fn changes_computed(&self, phase: SyncPhase, changes: &ResourceCounts);

    fn phase_skipped(&self, phase: SyncPhase, reason: &str);

    fn kind_started(&self, phase: SyncPhase, kind: ResourceKind, total: usize);

    /// Called per entity; implementations decide whether to show it
    fn entity_applied(&self, phase: SyncPhase, kind: ResourceKind, label: &str);

    fn entity_failed(&self, phase: SyncPhase, kind: ResourceKind, label: &str, error: &anyhow::Error);

    fn kind_finished(&self, phase: SyncPhase, kind: ResourceKind, applied: usize, total: usize);

    fn finished(&self, report: &SyncReport);
}

/// Coloured terminal output
pub struct ConsoleProgress {
    verbose: bool,
}

impl ConsoleProgress {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl SyncProgress for ConsoleProgress {
    fn phase_started(&self, phase: SyncPhase, endpoint: &str) {
        println!();
        println!("{} {}", phase.title().bold().cyan(), endpoint.dimmed());
    }

    fn kind_fetched(&self, kind: ResourceKind, count: usize) {
        println!("  {:>8} {}", count.to_string().bold(), kind.plural());
    }

    fn changes_computed(&self, phase: SyncPhase, changes: &ResourceCounts) {
        let total = changes.total();
        let headline = format!("{} {} planned", total, phase.noun());
        if total == 0 {
            println!("  {}", headline.green());
        } else {
            println!("  {}", headline.yellow());
            for kind in phase.order() {
                let count = changes.get(kind);
                if count > 0 {
                    println!("  {:>8} {}", count.to_string().bold(), kind.plural());
                }
            }
        }
    }

    fn phase_skipped(&self, phase: SyncPhase, reason: &str) {
        println!("  {} {} ({})", "Skipped".yellow(), phase.noun(), reason);
    }

    fn kind_started(&self, phase: SyncPhase, kind: ResourceKind, total: usize) {
        println!("  {} {} {}", phase.verb(), total, kind.plural());
    }

    fn entity_applied(&self, phase: SyncPhase, kind: ResourceKind, label: &str) {
        if self.verbose {
            println!("    {} {} {}", phase.past_tense().dimmed(), kind, label);
        }
    }

    fn entity_failed(&self, phase: SyncPhase, kind: ResourceKind, label: &str, error: &anyhow::Error) {
        println!(
            "    {} {} {} {}: {:#}",
            "Failed to".red(),
            phase.verb().to_lowercase().red(),
            kind,
            label,
            error
        );
    }

    fn kind_finished(&self, phase: SyncPhase, kind: ResourceKind, applied: usize, total: usize) {
        let line = format!("{} {}/{} {}", phase.past_tense(), applied, total, kind.plural());
        if applied == total {
            println!("  {} {}", "✓".green(), line);
        } else {
            println!("  {} {}", "✗".red(), line);
        }
    }

    fn finished(&self, report: &SyncReport) {
        println!();
        let headline = if report.dry_run {
            "Dry run complete".bold().yellow()
        } else {
            "Sync complete".bold().green()
        };
        println!("{} in {:.2}s", headline, report.duration.as_secs_f64());
        println!("  Source       {}", report.source);
        println!("  Destination  {}", report.destination);

        if report.insert_only {
            println!("  Deletions skipped (insert-only)");
        }
        if let Some(deletions) = &report.deletions {
            println!(
                "  Deleted {} of {} planned",
                report.deleted.total().to_string().bold(),
                deletions.total()
            );
        }
        println!(
            "  Inserted {} of {} planned",
            report.inserted.total().to_string().bold(),
            report.insertions.total()
        );
    }
}

/// Log-only reporter for non-interactive runs
pub struct LogProgress;

impl SyncProgress for LogProgress {
    fn phase_started(&self, phase: SyncPhase, endpoint: &str) {
        info!("{} {}", phase.title(), endpoint);
    }

    fn kind_fetched(&self, kind: ResourceKind, count: usize) {
        info!("Fetched {} {}", count, kind.plural());
    }

    fn changes_computed(&self, phase: SyncPhase, changes: &ResourceCounts) {
        info!("Computed {}: {}", phase.noun(), changes);
    }

    fn phase_skipped(&self, phase: SyncPhase, reason: &str) {
        info!("Skipped {} ({})", phase.noun(), reason);
    }

    fn kind_started(&self, phase: SyncPhase, kind: ResourceKind, total: usize) {
        info!("{} {} {}", phase.verb(), total, kind.plural());
    }

    fn entity_applied(&self, phase: SyncPhase, kind: ResourceKind, label: &str) {
        debug!("{} {} {}", phase.past_tense(), kind, label);
    }

    fn entity_failed(&self, phase: SyncPhase, kind: ResourceKind, label: &str, error: &anyhow::Error) {
        warn!("{} of {} {} failed: {:#}", phase.noun(), kind, label, error);
    }

    fn kind_finished(&self, phase: SyncPhase, kind: ResourceKind, applied: usize, total: usize) {
        info!("{} {}/{} {}", phase.past_tense(), applied, total, kind.plural());
    }

    fn finished(&self, report: &SyncReport) {
        info!(
            "Sync finished in {:.2}s: source [{}], destination before [{}], deleted {}, inserted {}{}{}",
            report.duration.as_secs_f64(),
            report.source,
            report.destination,
            report.deleted.total(),
            report.inserted.total(),
            if report.insert_only { " (insert-only)" } else { "" },
            if report.dry_run { " (dry run)" } else { "" }
        );
    }
}
