//! Command-line interface

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::context::ContextCommands;
use commands::sync::SyncCommands;

#[derive(Parser)]
#[command(name = "authz-sync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reconcile authorization graphs between tenants")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the context database (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config_db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synchronize authorization data between tenants
    #[command(subcommand)]
    Sync(SyncCommands),
    /// Manage saved tenant contexts
    #[command(subcommand)]
    Context(ContextCommands),
}

impl Cli {
    /// Whether the invoked command asked for verbose output
    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::Sync(SyncCommands::Tenant(args)) => args.verbose,
            Commands::Context(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_tenant() {
        let cli = Cli::try_parse_from([
            "authz-sync",
            "--config-db",
            "/tmp/test.db",
            "sync",
            "tenant",
            "--source",
            "staging",
            "--destination-url",
            "https://prod.example.com",
            "--destination-client-id",
            "prod-client",
            "--dry-run",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose());
        assert_eq!(cli.config_db, Some(PathBuf::from("/tmp/test.db")));
        let Commands::Sync(SyncCommands::Tenant(args)) = cli.command else {
            panic!("expected sync tenant");
        };
        assert_eq!(args.source.as_deref(), Some("staging"));
        assert_eq!(args.destination_client_secret_var, "UC_CLIENT_SECRET");
        assert!(args.dry_run);
        assert!(!args.insert_only);
        assert_eq!(args.page_size, 1000);
        assert_eq!(args.max_attempts, 3);
        assert_eq!(args.timeout, 60);
    }

    #[test]
    fn test_parse_sync_transport_flags() {
        let cli = Cli::try_parse_from([
            "authz-sync",
            "sync",
            "tenant",
            "--page-size",
            "50",
            "--max-attempts",
            "1",
            "--timeout",
            "5",
        ])
        .unwrap();

        let Commands::Sync(SyncCommands::Tenant(args)) = cli.command else {
            panic!("expected sync tenant");
        };
        assert_eq!(args.page_size, 50);
        assert_eq!(args.max_attempts, 1);
        assert_eq!(args.timeout, 5);
    }

    #[test]
    fn test_parse_context_set() {
        let cli = Cli::try_parse_from([
            "authz-sync",
            "context",
            "set",
            "staging",
            "--url",
            "https://staging.example.com",
            "--client-id",
            "abc",
        ])
        .unwrap();

        let Commands::Context(ContextCommands::Set { name, client_secret, .. }) = cli.command else {
            panic!("expected context set");
        };
        assert_eq!(name, "staging");
        assert!(client_secret.is_none());
    }
}
