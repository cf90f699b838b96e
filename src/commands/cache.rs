use colored::Colorize;
use sha2::{Digest, Sha256};

use super::{corpus_cache, runtime};
use crate::config::Config;
use crate::embeddings::{corpus_stats, FileCacheStore, StoredEmbedding};
use crate::error::{MatchError, Result};

pub fn cmd_cache_status(config: &Config) -> Result<()> {
    let path = FileCacheStore::new(config.cache_dir.clone()).path_for(&config.storage_key);
    let cache = corpus_cache(config);

    let raw = runtime()?.block_on(cache.raw())?;
    let Some(raw) = raw else {
        println!(
            "{} No cached corpus at {}",
            "Cache".green().bold(),
            path.display()
        );
        println!("Build one with: {}", "dashmatch index".cyan());
        return Ok(());
    };

    println!("{} {}", "Cache".green().bold(), path.display());
    println!(
        "  Size:        {}",
        humansize::format_size(raw.len() as u64, humansize::DECIMAL)
    );
    if let Ok(modified) = std::fs::metadata(&path).and_then(|m| m.modified()) {
        let modified: chrono::DateTime<chrono::Local> = modified.into();
        println!("  Written:     {}", modified.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("  Fingerprint: {}", fingerprint(&raw));

    match serde_json::from_str::<Vec<StoredEmbedding>>(&raw) {
        Ok(corpus) => {
            let stats = corpus_stats(&corpus);
            println!("  Dashboards:  {}", stats.dashboards);
            println!("  Units:       {}", stats.total_units);
            if stats.placeholders > 0 {
                println!("  Unembedded:  {}", stats.placeholders.to_string().yellow());
            }
            if stats.all_placeholders() {
                println!(
                    "  {} nothing embedded; run {} once the backend is reachable",
                    "!".yellow(),
                    "dashmatch cache clear".cyan()
                );
            }
        }
        Err(e) => println!("  {} unreadable corpus: {}", "!".red(), e),
    }

    Ok(())
}

pub fn cmd_cache_clear(config: &Config, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete the cached corpus '{}'?",
                config.storage_key
            ))
            .default(false)
            .interact()
            .map_err(|e| MatchError::Config(format!("prompt failed: {}", e)))?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    runtime()?.block_on(corpus_cache(config).clear())?;
    println!("{} Cached corpus removed.", "Done!".green().bold());
    Ok(())
}

/// Short SHA-256 of the cached payload, to tell corpora apart
fn fingerprint(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}
