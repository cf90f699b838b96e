#![allow(dead_code)]
mod catalog;
mod cli;
mod commands;
mod config;
mod corpus;
mod embeddings;
mod error;
mod llm;
mod providers;
mod session;
mod state;
#[cfg(test)]
mod testing;

use clap::Parser;
use cli::{CacheCommand, Cli, Commands};
use config::Config;
use error::Result;
use tracing_subscriber::EnvFilter;

use commands::cache::{cmd_cache_clear, cmd_cache_status};
use commands::matching::{cmd_index, cmd_match, cmd_show};

fn init_tracing(verbose: bool) {
    let default = if verbose { "dashmatch=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.provider.as_deref())?;
    let catalog_file = cli.catalog_file.as_deref();

    match cli.command {
        Commands::Index { refresh } => cmd_index(&config, catalog_file, refresh),
        Commands::Match { query, top } => cmd_match(&config, catalog_file, &query, top),
        Commands::Show { id } => cmd_show(&config, catalog_file, &id),
        Commands::Cache { command } => match command {
            CacheCommand::Status => cmd_cache_status(&config),
            CacheCommand::Clear { yes } => cmd_cache_clear(&config, yes),
        },
    }
}
