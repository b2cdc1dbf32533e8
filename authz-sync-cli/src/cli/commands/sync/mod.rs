//! `sync` command definitions

pub mod endpoint;
pub mod handler;

use clap::{Args, Subcommand};

pub use handler::handle_sync_command;

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Make a destination tenant's authorization graph match a source tenant
    Tenant(TenantSyncArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TenantSyncArgs {
    /// Saved context to read from
    #[arg(long)]
    pub source: Option<String>,

    /// Source tenant URL (overrides the context)
    #[arg(long)]
    pub source_url: Option<String>,

    /// Source client id (overrides the context)
    #[arg(long)]
    pub source_client_id: Option<String>,

    /// Environment variable holding the source client secret
    #[arg(long, default_value = "UC_CLIENT_SECRET")]
    pub source_client_secret_var: String,

    /// Saved context to write to
    #[arg(long)]
    pub destination: Option<String>,

    /// Destination tenant URL (overrides the context)
    #[arg(long)]
    pub destination_url: Option<String>,

    /// Destination client id (overrides the context)
    #[arg(long)]
    pub destination_client_id: Option<String>,

    /// Environment variable holding the destination client secret
    #[arg(long, default_value = "UC_CLIENT_SECRET")]
    pub destination_client_secret_var: String,

    /// Compute and print the changes without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Only create missing entities, never delete
    #[arg(long)]
    pub insert_only: bool,

    /// Keep applying after a failed change and report every failure at the end of the phase
    #[arg(long)]
    pub continue_on_error: bool,

    /// Entities requested per list page
    #[arg(long, default_value_t = 1000)]
    pub page_size: u32,

    /// Attempts per read request, including the first (1 disables retries)
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Show every entity as it is applied
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
