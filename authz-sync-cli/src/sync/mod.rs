//! Reconciliation engine
//!
//! Fetches a snapshot of each tenant, diffs them by identity and content,
//! and applies the resulting change-sets to the destination in dependency
//! order.

pub mod apply;
pub mod diff;
pub mod engine;
pub mod fetch;
pub mod progress;
pub mod resources;

#[cfg(test)]
pub mod testing;

pub use apply::FailureMode;
pub use engine::{SyncEngine, SyncOptions};
pub use progress::{ConsoleProgress, LogProgress, SyncProgress};
