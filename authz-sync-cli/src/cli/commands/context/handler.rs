//! `context` command handler

use std::path::Path;

use anyhow::{Context, Result};
use colored::*;

use super::ContextCommands;
use crate::api::http::normalize_base_url;
use crate::config::Config;
use crate::secret::SecretString;

pub async fn handle_context_command(command: ContextCommands, config_db: Option<&Path>) -> Result<()> {
    let config = Config::load(config_db).await?;

    match command {
        ContextCommands::List => list_contexts(&config).await,
        ContextCommands::Show { name } => show_context(&config, name).await,
        ContextCommands::Set {
            name,
            url,
            client_id,
            client_secret,
        } => set_context(&config, &name, &url, &client_id, client_secret).await,
        ContextCommands::Use { name } => {
            config.set_current_context(&name).await?;
            println!("Switched to context {}", name.cyan().bold());
            Ok(())
        }
        ContextCommands::Delete { name } => {
            config.delete_context(&name).await?;
            println!("Deleted context {}", name.cyan().bold());
            Ok(())
        }
    }
}

async fn list_contexts(config: &Config) -> Result<()> {
    let contexts = config.list_contexts().await?;
    if contexts.is_empty() {
        println!("No contexts saved. Add one with 'authz-sync context set <name> --url <url> --client-id <id>'");
        return Ok(());
    }

    let current = config.current_context().await?;
    let name_width = contexts.iter().map(|c| c.name.len()).max().unwrap_or(4).max(4);

    println!("  {:<name_width$}  {}", "NAME".bold(), "URL".bold());
    for ctx in contexts {
        let is_current = current.as_deref() == Some(ctx.name.as_str());
        let marker = if is_current { "*".green().bold() } else { " ".normal() };
        let name = format!("{:<name_width$}", ctx.name);
        let name = if is_current { name.green().bold() } else { name.normal() };
        println!("{} {}  {}", marker, name, ctx.url.dimmed());
    }

    Ok(())
}

async fn show_context(config: &Config, name: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => config
            .current_context()
            .await?
            .context("No current context. Pass a name or run 'authz-sync context use <name>'")?,
    };

    let ctx = config.require_context(&name).await?;
    let is_current = config.current_context().await?.as_deref() == Some(ctx.name.as_str());

    println!("{}{}", ctx.name.cyan().bold(), if is_current { " (current)" } else { "" });
    println!("  URL:           {}", ctx.url);
    println!("  Client ID:     {}", ctx.client_id);
    println!("  Client secret: {}", ctx.client_secret);
    println!("  Created:       {}", ctx.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Updated:       {}", ctx.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));

    Ok(())
}

async fn set_context(
    config: &Config,
    name: &str,
    url: &str,
    client_id: &str,
    client_secret: Option<String>,
) -> Result<()> {
    normalize_base_url(url)?;
    if client_id.trim().is_empty() {
        anyhow::bail!("Client id cannot be empty");
    }

    let raw_secret = match client_secret {
        Some(secret) => secret,
        None => rpassword::prompt_password(format!("Client secret for {}: ", name))
            .context("Failed to read client secret")?,
    };
    if raw_secret.is_empty() {
        anyhow::bail!("Client secret cannot be empty");
    }

    let secret = SecretString::from_user_input(&raw_secret);
    config.save_context(name, url, client_id, &secret).await?;

    println!("Saved context {}", name.cyan().bold());
    if config.current_context().await?.as_deref() == Some(name) {
        println!("  {} is the current context", name);
    }

    Ok(())
}
