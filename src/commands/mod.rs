pub mod cache;
pub mod matching;

use std::path::Path;
use std::sync::Arc;

use crate::catalog::{Catalog, FileCatalog, LookerCatalog};
use crate::config::Config;
use crate::embeddings::{EmbeddingCache, EmbeddingProvider, FileCacheStore};
use crate::error::{MatchError, Result};
use crate::llm::LlmClient;
use crate::session::SessionBackends;

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| MatchError::Config(format!("tokio runtime: {}", e)))
}

fn corpus_cache(config: &Config) -> EmbeddingCache {
    EmbeddingCache::new(
        Arc::new(FileCacheStore::new(config.cache_dir.clone())),
        config.storage_key.clone(),
    )
}

fn catalog(config: &Config, catalog_file: Option<&Path>) -> Result<Arc<dyn Catalog>> {
    if let Some(path) = catalog_file {
        return Ok(Arc::new(FileCatalog::load(path)?));
    }
    match config.catalog {
        Some(ref catalog) => Ok(Arc::new(LookerCatalog::new(
            catalog,
            config.folder_ids.clone(),
        ))),
        None => Err(MatchError::Config(
            "No catalog configured. Set LOOKER_BASE_URL, LOOKER_CLIENT_ID and \
             LOOKER_CLIENT_SECRET, or pass --catalog-file"
                .into(),
        )),
    }
}

fn backends(config: &Config, catalog_file: Option<&Path>) -> Result<SessionBackends> {
    Ok(SessionBackends {
        catalog: catalog(config, catalog_file)?,
        embedder: Arc::new(EmbeddingProvider::new(&config.embedder)),
        generator: Arc::new(LlmClient::new(&config.generator)),
        cache: Arc::new(corpus_cache(config)),
    })
}
