//! Cache command - manage the response cache.

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;
use wayfarer_store::{FreshnessIndex, ResponseCache};

use crate::{Cli, ExitCode};

/// Arguments for the cache command.
#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands.
#[derive(Subcommand)]
pub enum CacheAction {
    /// Drop all cached responses and freshness records.
    Clear,
}

/// Runs the cache command.
pub async fn run(args: &CacheArgs, cli: &Cli) -> Result<ExitCode> {
    match args.action {
        CacheAction::Clear => clear(cli).await,
    }
}

async fn clear(cli: &Cli) -> Result<ExitCode> {
    ResponseCache::at_default_location().clear().await?;
    FreshnessIndex::load_default().await.clear().await?;

    info!("Response cache cleared");
    if !cli.quiet {
        println!("Cache cleared");
    }
    Ok(ExitCode::Success)
}
