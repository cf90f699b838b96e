use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dashmatch",
    about = "Find the dashboards that best match a free-text question",
    version
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(global = true, long, short)]
    pub verbose: bool,

    /// Backend provider override (openai, gemini, ollama, anthropic)
    #[arg(global = true, long)]
    pub provider: Option<String>,

    /// Read dashboards from a JSON export instead of the catalog API
    #[arg(global = true, long)]
    pub catalog_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the embedding corpus (or load it from cache)
    Index {
        /// Rebuild even if a cached corpus exists
        #[arg(long)]
        refresh: bool,
    },

    /// Rank dashboards against a query and summarize the best ones
    Match {
        /// Free-text query
        query: String,

        /// Number of distinct dashboards to return
        #[arg(long, short)]
        top: Option<usize>,
    },

    /// Select a dashboard and show its record
    Show {
        /// Dashboard id
        id: String,
    },

    /// Inspect or clear the cached corpus
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Show size, age and contents of the cached corpus
    Status,

    /// Delete the cached corpus so the next run rebuilds it
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}
