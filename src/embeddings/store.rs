use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{corpus_stats, StoredEmbedding, TextEmbedder};
use crate::catalog::Catalog;
use crate::corpus::{build_catalog_corpus, MetadataUnit};
use crate::error::Result;

/// Keyed string store the corpus is persisted in
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites unconditionally
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key under a directory
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process store; contents die with the session
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Where a loaded corpus came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusSource {
    Cache,
    Built,
}

/// The catalog's embedded corpus, persisted under a single key
pub struct EmbeddingCache {
    store: Arc<dyn CacheStore>,
    key: String,
}

impl EmbeddingCache {
    pub fn new(store: Arc<dyn CacheStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw cached payload, if any
    pub async fn raw(&self) -> Result<Option<String>> {
        Ok(self.store.get(&self.key).await?.filter(|s| !s.is_empty()))
    }

    /// Cached corpus, if a readable one exists
    pub async fn cached(&self) -> Result<Option<Vec<StoredEmbedding>>> {
        let Some(raw) = self.raw().await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(corpus) => Ok(Some(corpus)),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "ignoring unreadable cached corpus");
                Ok(None)
            }
        }
    }

    /// Cached corpus, or build, embed and persist it on a miss
    pub async fn load_corpus(
        &self,
        catalog: &dyn Catalog,
        embedder: &dyn TextEmbedder,
    ) -> Result<Vec<StoredEmbedding>> {
        Ok(self.load(catalog, embedder).await?.0)
    }

    pub async fn load(
        &self,
        catalog: &dyn Catalog,
        embedder: &dyn TextEmbedder,
    ) -> Result<(Vec<StoredEmbedding>, CorpusSource)> {
        if let Some(corpus) = self.cached().await? {
            tracing::debug!(key = %self.key, units = corpus.len(), "corpus cache hit");
            if corpus_stats(&corpus).all_placeholders() {
                tracing::warn!(
                    key = %self.key,
                    "cached corpus has no embedded units; run `dashmatch cache clear` once the backend is up"
                );
            }
            return Ok((corpus, CorpusSource::Cache));
        }
        tracing::debug!(key = %self.key, "corpus cache miss");
        let corpus = self.rebuild(catalog, embedder).await?;
        Ok((corpus, CorpusSource::Built))
    }

    /// Build and persist the corpus regardless of what is cached
    pub async fn rebuild(
        &self,
        catalog: &dyn Catalog,
        embedder: &dyn TextEmbedder,
    ) -> Result<Vec<StoredEmbedding>> {
        let units = build_catalog_corpus(catalog).await;
        let corpus = embed_units(units, embedder).await;

        let placeholders = corpus.iter().filter(|e| e.is_placeholder()).count();
        tracing::info!(units = corpus.len(), placeholders, "corpus built");

        let json = serde_json::to_string(&corpus)?;
        self.store.set(&self.key, &json).await?;
        Ok(corpus)
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(&self.key).await
    }
}

/// Embed every unit concurrently. Units that fail become placeholders.
pub async fn embed_units(
    units: Vec<MetadataUnit>,
    embedder: &dyn TextEmbedder,
) -> Vec<StoredEmbedding> {
    futures::future::join_all(units.into_iter().map(|unit| async move {
        match embed_unit(&unit, embedder).await {
            Some(embedding) => StoredEmbedding::new(unit, embedding),
            None => StoredEmbedding::placeholder(unit),
        }
    }))
    .await
}

async fn embed_unit(unit: &MetadataUnit, embedder: &dyn TextEmbedder) -> Option<Vec<f32>> {
    let text = match unit.to_embedding_text() {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(dashboard_id = %unit.dashboard_id(), error = %e, "could not serialize unit");
            return None;
        }
    };

    match embedder.embed_text(&text).await {
        Ok(embedding) if !embedding.is_empty() => Some(embedding),
        Ok(_) => {
            tracing::warn!(dashboard_id = %unit.dashboard_id(), "embedding backend returned no vector");
            None
        }
        Err(e) => {
            tracing::warn!(dashboard_id = %unit.dashboard_id(), error = %e, "embedding failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_catalog, KeywordEmbedder};

    #[tokio::test]
    async fn test_file_store_roundtrip_and_remove() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileCacheStore::new(tmp.path().join("nested"));

        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "[1]").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("[1]"));
        assert!(store.path_for("k").ends_with("k.json"));

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_miss_builds_and_persists() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = EmbeddingCache::new(store.clone(), "corpus");
        let embedder = KeywordEmbedder::new();

        let (corpus, source) = cache.load(&sample_catalog(), &embedder).await.unwrap();
        assert_eq!(source, CorpusSource::Built);
        assert_eq!(corpus.len(), 4);
        assert_eq!(embedder.calls(), 4);
        assert!(store.get("corpus").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_second_load_is_served_from_cache() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = EmbeddingCache::new(store.clone(), "corpus");
        let embedder = KeywordEmbedder::new();
        let catalog = sample_catalog();

        cache.load_corpus(&catalog, &embedder).await.unwrap();
        let first_raw = store.get("corpus").await.unwrap();
        let calls_after_first = embedder.calls();

        let (corpus, source) = cache.load(&catalog, &embedder).await.unwrap();
        assert_eq!(source, CorpusSource::Cache);
        assert_eq!(embedder.calls(), calls_after_first);
        assert_eq!(serde_json::to_string(&corpus).ok(), first_raw);
    }

    #[tokio::test]
    async fn test_failed_unit_becomes_placeholder() {
        let cache = EmbeddingCache::new(Arc::new(MemoryCacheStore::new()), "corpus");
        let embedder = KeywordEmbedder::failing_on("Churn");

        let corpus = cache
            .load_corpus(&sample_catalog(), &embedder)
            .await
            .unwrap();
        assert_eq!(corpus.len(), 4);
        let placeholders: Vec<_> = corpus.iter().filter(|e| e.is_placeholder()).collect();
        assert_eq!(placeholders.len(), 1);
        assert_eq!(placeholders[0].metadata.best_element_label(), Some("Churn"));
    }

    #[tokio::test]
    async fn test_empty_or_corrupt_cache_is_a_miss() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = EmbeddingCache::new(store.clone(), "corpus");

        store.set("corpus", "").await.unwrap();
        assert!(cache.cached().await.unwrap().is_none());

        store.set("corpus", "{not json").await.unwrap();
        assert!(cache.cached().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_forces_rebuild() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = EmbeddingCache::new(store, "corpus");
        let embedder = KeywordEmbedder::new();
        let catalog = sample_catalog();

        cache.load_corpus(&catalog, &embedder).await.unwrap();
        cache.clear().await.unwrap();
        let (_, source) = cache.load(&catalog, &embedder).await.unwrap();
        assert_eq!(source, CorpusSource::Built);
        assert_eq!(embedder.calls(), 8);
    }

    #[tokio::test]
    async fn test_all_placeholder_cache_is_still_served() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = EmbeddingCache::new(store, "corpus");
        let catalog = sample_catalog();

        let broken = KeywordEmbedder::failing_on("\"id\"");
        let built = cache.load_corpus(&catalog, &broken).await.unwrap();
        assert!(corpus_stats(&built).all_placeholders());

        let embedder = KeywordEmbedder::new();
        let (corpus, source) = cache.load(&catalog, &embedder).await.unwrap();
        assert_eq!(source, CorpusSource::Cache);
        assert_eq!(embedder.calls(), 0);
        assert!(corpus_stats(&corpus).all_placeholders());
    }
}
