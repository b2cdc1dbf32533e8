mod api;
mod cli;
mod config;
mod secret;
mod sync;

use anyhow::Result;
use clap::Parser;
use colored::*;
use is_terminal::IsTerminal;

use cli::{Cli, Commands};
use cli::commands::context::handle_context_command;
use cli::commands::sync::handle_sync_command;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose());

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let default_filter = format!("warn,{}={}", env!("CARGO_CRATE_NAME"), level);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config_db = cli.config_db.as_deref();

    match cli.command {
        Commands::Sync(command) => handle_sync_command(command, config_db).await,
        Commands::Context(command) => handle_context_command(command, config_db).await,
    }
}
