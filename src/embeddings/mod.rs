pub mod provider;
pub mod search;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::corpus::MetadataUnit;

pub use provider::{EmbeddingProvider, TextEmbedder};
pub use search::{rank, RankOutcome};
pub use store::{CacheStore, EmbeddingCache, FileCacheStore, MemoryCacheStore};

/// A metadata unit with its embedding, as persisted in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEmbedding {
    /// Owning dashboard id
    pub id: String,
    /// Empty for units whose embedding request failed
    pub embedding: Vec<f32>,
    pub metadata: MetadataUnit,
}

impl StoredEmbedding {
    pub fn new(metadata: MetadataUnit, embedding: Vec<f32>) -> Self {
        Self {
            id: metadata.dashboard_id().to_string(),
            embedding,
            metadata,
        }
    }

    /// Stand-in for a unit that could not be embedded
    pub fn placeholder(metadata: MetadataUnit) -> Self {
        Self::new(metadata, Vec::new())
    }

    pub fn is_placeholder(&self) -> bool {
        self.embedding.is_empty()
    }
}

/// One scored result for a query. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
    pub id: String,
    pub metadata: MetadataUnit,
    pub similarity: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when the lengths differ or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// Summary counts over a corpus
pub struct CorpusStats {
    pub total_units: usize,
    pub dashboards: usize,
    pub placeholders: usize,
    pub dimensions: Option<usize>,
}

impl CorpusStats {
    /// Non-empty, but nothing in it can be ranked
    pub fn all_placeholders(&self) -> bool {
        self.total_units > 0 && self.placeholders == self.total_units
    }
}

pub fn corpus_stats(corpus: &[StoredEmbedding]) -> CorpusStats {
    let dashboards: std::collections::HashSet<&str> =
        corpus.iter().map(|e| e.id.as_str()).collect();
    CorpusStats {
        total_units: corpus.len(),
        dashboards: dashboards.len(),
        placeholders: corpus.iter().filter(|e| e.is_placeholder()).count(),
        dimensions: corpus
            .iter()
            .find(|e| !e.is_placeholder())
            .map(|e| e.embedding.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::DashboardMetadata;

    fn unit(id: &str) -> MetadataUnit {
        MetadataUnit::DashboardOnly {
            dashboard: DashboardMetadata {
                id: id.into(),
                title: None,
                description: None,
            },
        }
    }

    #[test]
    fn test_cosine_identical_is_one() {
        let a: [f32; 4] = [0.3, -1.2, 4.0, 0.5];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_is_symmetric() {
        let a: [f32; 3] = [1.0, 2.0, 3.0];
        let b: [f32; 3] = [-2.0, 0.5, 1.5];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate_inputs_are_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_stored_embedding_takes_owner_id() {
        let stored = StoredEmbedding::new(unit("D9"), vec![1.0]);
        assert_eq!(stored.id, "D9");
        assert!(!stored.is_placeholder());
        assert!(StoredEmbedding::placeholder(unit("D9")).is_placeholder());
    }

    #[test]
    fn test_corpus_stats() {
        let corpus = vec![
            StoredEmbedding::new(unit("A"), vec![1.0, 0.0, 0.0]),
            StoredEmbedding::new(unit("A"), vec![0.0, 1.0, 0.0]),
            StoredEmbedding::placeholder(unit("B")),
        ];
        let stats = corpus_stats(&corpus);
        assert_eq!(stats.total_units, 3);
        assert_eq!(stats.dashboards, 2);
        assert_eq!(stats.placeholders, 1);
        assert_eq!(stats.dimensions, Some(3));
        assert!(!stats.all_placeholders());
    }

    #[test]
    fn test_all_placeholders() {
        let corpus = vec![
            StoredEmbedding::placeholder(unit("A")),
            StoredEmbedding::placeholder(unit("B")),
        ];
        assert!(corpus_stats(&corpus).all_placeholders());
        assert!(!corpus_stats(&[]).all_placeholders());
    }
}
