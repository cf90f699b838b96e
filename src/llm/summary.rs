use super::prompts::summary_prompt;
use super::TextGenerator;
use crate::corpus::MetadataUnit;
use crate::embeddings::Similarity;
use crate::error::{MatchError, Result};

/// Ask the generator for a short prose description of one unit.
/// Returns the first candidate verbatim.
pub async fn summarize(metadata: &MetadataUnit, generator: &dyn TextGenerator) -> Result<String> {
    let json = metadata.to_embedding_text()?;
    let prompt = summary_prompt(&json, metadata.dashboard().title.as_deref());
    let generation = generator.generate_text(&prompt).await?;
    generation
        .candidates
        .into_iter()
        .next()
        .map(|c| c.output)
        .ok_or(MatchError::LlmEmptyResponse)
}

/// Summarize every result concurrently. A failed summary becomes an empty
/// string; order is preserved.
pub async fn summarize_all(
    results: Vec<Similarity>,
    generator: &dyn TextGenerator,
) -> Vec<Similarity> {
    futures::future::join_all(results.into_iter().map(|mut item| async move {
        let summary = match summarize(&item.metadata, generator).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(dashboard_id = %item.id, error = %e, "summary failed");
                String::new()
            }
        };
        item.summary = Some(summary);
        item
    }))
    .await
}
