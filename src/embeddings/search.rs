use std::collections::HashSet;

use super::{cosine_similarity, Similarity, StoredEmbedding, TextEmbedder};

/// Result of ranking a query against the corpus
#[derive(Debug, Clone, PartialEq)]
pub enum RankOutcome {
    /// Best match per dashboard, highest similarity first
    Ranked(Vec<Similarity>),
    /// The query itself could not be embedded
    QueryEmbeddingFailed(String),
}

/// Embed `query` and return the `top_k` most similar distinct dashboards.
pub async fn rank(
    query: &str,
    corpus: &[StoredEmbedding],
    top_k: usize,
    embedder: &dyn TextEmbedder,
) -> RankOutcome {
    let query_embedding = match embedder.embed_text(query).await {
        Ok(embedding) if !embedding.is_empty() => embedding,
        Ok(_) => return RankOutcome::QueryEmbeddingFailed("query embedding was empty".into()),
        Err(e) => return RankOutcome::QueryEmbeddingFailed(e.to_string()),
    };

    let scored = score_corpus(&query_embedding, corpus);
    RankOutcome::Ranked(select_top_distinct(scored, top_k))
}

/// Score every embedded unit against the query, highest first.
/// Placeholders are skipped; equal scores keep corpus order.
pub fn score_corpus(query_embedding: &[f32], corpus: &[StoredEmbedding]) -> Vec<Similarity> {
    let mut scored: Vec<Similarity> = corpus
        .iter()
        .filter(|entry| !entry.is_placeholder())
        .map(|entry| Similarity {
            id: entry.id.clone(),
            metadata: entry.metadata.clone(),
            similarity: cosine_similarity(query_embedding, &entry.embedding),
            summary: None,
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored
}

/// Keep the first (best) entry per dashboard id until `top_k` ids are
/// collected or the list runs out.
pub fn select_top_distinct(sorted: Vec<Similarity>, top_k: usize) -> Vec<Similarity> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut selected = Vec::with_capacity(top_k.min(sorted.len()));

    for item in sorted {
        if selected.len() >= top_k {
            break;
        }
        if seen.insert(item.id.clone()) {
            selected.push(item);
        }
    }

    selected
}
