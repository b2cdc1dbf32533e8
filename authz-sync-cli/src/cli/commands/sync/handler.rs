//! `sync` command handler

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use colored::*;
use is_terminal::IsTerminal;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use super::endpoint::{ResolvedEndpoint, Side, resolve_endpoint};
use super::{SyncCommands, TenantSyncArgs};
use crate::api::{AuthzHttpClient, ResilienceConfig};
use crate::config::Config;
use crate::config::repository::contexts::TenantContext;
use crate::sync::{ConsoleProgress, FailureMode, LogProgress, SyncEngine, SyncOptions, SyncProgress};

pub async fn handle_sync_command(command: SyncCommands, config_db: Option<&Path>) -> Result<()> {
    match command {
        SyncCommands::Tenant(args) => handle_tenant_sync(args, config_db).await,
    }
}

async fn handle_tenant_sync(args: TenantSyncArgs, config_db: Option<&Path>) -> Result<()> {
    if args.no_color {
        colored::control::set_override(false);
    }

    // Resolve both sides before touching the network
    let source = resolve_side(&args, Side::Source, config_db).await?;
    let destination = resolve_side(&args, Side::Destination, config_db).await?;

    if source.url.trim_end_matches('/') == destination.url.trim_end_matches('/') {
        warn!("Source and destination point at the same tenant ({})", source.url);
    }

    let resilience = ResilienceConfig::builder()
        .request_logging(args.verbose)
        .page_size(args.page_size)
        .max_attempts(args.max_attempts)
        .request_timeout(Duration::from_secs(args.timeout))
        .build();
    let source_client = AuthzHttpClient::new(&source.url, source.credentials, resilience.clone())?;
    let destination_client =
        AuthzHttpClient::new(&destination.url, destination.credentials, resilience)?;

    let options = SyncOptions {
        dry_run: args.dry_run,
        insert_only: args.insert_only,
        failure_mode: if args.continue_on_error {
            FailureMode::CollectErrors
        } else {
            FailureMode::FailFast
        },
    };

    if options.dry_run {
        println!("{}", "Dry run: no changes will be applied".yellow());
    }

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping after the current request");
                cancel.cancel();
            }
        })
    };

    let progress: Box<dyn SyncProgress> = if std::io::stdout().is_terminal() {
        Box::new(ConsoleProgress::new(args.verbose))
    } else {
        Box::new(LogProgress)
    };

    let engine = SyncEngine::new(&source_client, &destination_client, progress.as_ref());
    let result = engine.run(options, &cancel).await;
    interrupt.abort();

    let report = result?;
    info!(
        "Synced {} -> {}: {} deleted, {} inserted",
        report.source_endpoint,
        report.destination_endpoint,
        report.deleted.total(),
        report.inserted.total()
    );
    Ok(())
}

async fn resolve_side(
    args: &TenantSyncArgs,
    side: Side,
    config_db: Option<&Path>,
) -> Result<ResolvedEndpoint> {
    let flags = args.endpoint_flags(side);
    let context = match &flags.context {
        Some(name) => Some(load_context(name, config_db).await?),
        None => None,
    };

    resolve_endpoint(side, &flags, context.as_ref(), |name| std::env::var(name).ok())
}

async fn load_context(name: &str, config_db: Option<&Path>) -> Result<TenantContext> {
    let config = Config::load(config_db).await?;
    config.require_context(name).await
}
