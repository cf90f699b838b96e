use std::path::Path;

use colored::Colorize;

use super::{backends, runtime};
use crate::config::Config;
use crate::embeddings::corpus_stats;
use crate::embeddings::store::CorpusSource;
use crate::error::{MatchError, Result};
use crate::session::MatchSession;

pub fn cmd_index(config: &Config, catalog_file: Option<&Path>, refresh: bool) -> Result<()> {
    let backends = backends(config, catalog_file)?;

    runtime()?.block_on(async {
        println!("{} Loading dashboard corpus...", "Indexing".green().bold());

        let (corpus, source) = if refresh {
            let corpus = backends
                .cache
                .rebuild(backends.catalog.as_ref(), backends.embedder.as_ref())
                .await?;
            (corpus, CorpusSource::Built)
        } else {
            backends
                .cache
                .load(backends.catalog.as_ref(), backends.embedder.as_ref())
                .await?
        };

        let stats = corpus_stats(&corpus);
        let origin = match source {
            CorpusSource::Cache => "from cache",
            CorpusSource::Built => "freshly built",
        };
        println!("{} Corpus ready ({}):", "Done!".green().bold(), origin);
        println!("  Dashboards: {}", stats.dashboards);
        println!("  Units:      {}", stats.total_units);
        if let Some(dim) = stats.dimensions {
            println!("  Dimensions: {}", dim);
        }
        if stats.placeholders > 0 {
            println!(
                "  {} {} unit(s) could not be embedded",
                "!".yellow(),
                stats.placeholders
            );
        }
        println!("\nSearch with:");
        println!("  {}", "dashmatch match \"your question\"".cyan());

        Ok(())
    })
}

pub fn cmd_match(
    config: &Config,
    catalog_file: Option<&Path>,
    query: &str,
    top: Option<usize>,
) -> Result<()> {
    let top_k = top.unwrap_or(config.top_k);
    if top_k == 0 {
        return Err(MatchError::Config("--top must be at least 1".into()));
    }
    let backends = backends(config, catalog_file)?;

    runtime()?.block_on(async {
        let session = MatchSession::new(backends, top_k);

        let state = session.load_embeddings().await;
        if state.has_error() {
            return Err(MatchError::Session(state.error_message));
        }

        let state = session.find_matches(query).await;
        if state.has_error() {
            return Err(MatchError::Session(state.error_message));
        }

        println!("{} for '{}':\n", "Recommended Dashboards".green().bold(), query);
        if state.matches.is_empty() {
            println!("  {}", "No dashboards found.".yellow());
            return Ok(());
        }

        for (index, item) in state.matches.iter().enumerate() {
            let dashboard = item.metadata.dashboard();
            println!(
                "  {}. {} {} ({:.1}%)",
                index + 1,
                dashboard.title.as_deref().unwrap_or("(untitled)").bold(),
                format!("[{}]", item.id).dimmed(),
                item.similarity * 100.0
            );
            if let Some(element) = item.metadata.best_element_label() {
                println!("     {} {}", "Best element:".cyan(), element);
            }
            if let Some(summary) = item.summary.as_deref().filter(|s| !s.is_empty()) {
                println!("     {}", summary.trim());
            }
            println!();
        }

        Ok(())
    })
}

pub fn cmd_show(config: &Config, catalog_file: Option<&Path>, id: &str) -> Result<()> {
    let backends = backends(config, catalog_file)?;
    let top_k = config.top_k;

    runtime()?.block_on(async {
        let session = MatchSession::new(backends, top_k);
        let state = session.select_dashboard(id).await;

        let Some(dashboard) = state.current_dashboard else {
            return Err(MatchError::Session(state.error_message));
        };

        println!(
            "{} {}",
            dashboard.title.as_deref().unwrap_or("(untitled)").bold(),
            format!("[{}]", id).dimmed()
        );
        if let Some(description) = dashboard.description.as_deref() {
            println!("  {}", description);
        }

        let elements = dashboard.dashboard_elements.unwrap_or_default();
        println!("\n  {} element(s)", elements.len());
        for element in elements {
            let label = element
                .title
                .or(element.id)
                .unwrap_or_else(|| "(unnamed)".to_string());
            println!("    {} {}", "-".dimmed(), label);
        }

        Ok(())
    })
}
