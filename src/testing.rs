//! In-memory backends shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::catalog::{DashboardRecord, ElementRecord, FileCatalog};
use crate::embeddings::TextEmbedder;
use crate::error::{MatchError, Result};
use crate::llm::{Candidate, Generation, TextGenerator};

const VOCAB: &[&str] = &[
    "sales", "growth", "revenue", "churn", "latency", "ops", "hiring", "people",
];

/// Bag-of-keywords embedder: one dimension per vocabulary word plus a bias
#[derive(Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
    fail_on: Option<&'static str>,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails any text containing `needle`
    pub fn failing_on(needle: &'static str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: Some(needle),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextEmbedder for KeywordEmbedder {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(needle) = self.fail_on {
            if text.contains(needle) {
                return Err(MatchError::Embedding(format!("refusing {}", needle)));
            }
        }
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = VOCAB
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect();
        vector.push(0.1);
        Ok(vector)
    }
}

/// Generator that echoes the prompt length back as a one-line summary
pub struct EchoGenerator {
    pub fail: bool,
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate_text(&self, prompt: &str) -> Result<Generation> {
        if self.fail {
            return Err(MatchError::LlmEmptyResponse);
        }
        Ok(Generation {
            candidates: vec![Candidate {
                output: format!("Summary of a {} character prompt.", prompt.len()),
            }],
        })
    }
}

fn element(id: &str, title: &str) -> ElementRecord {
    ElementRecord {
        id: Some(id.into()),
        title: Some(title.into()),
        ..Default::default()
    }
}

/// Three dashboards, four units: D1 has two elements, D2 one, D3 none
pub fn sample_catalog() -> FileCatalog {
    FileCatalog::new(vec![
        DashboardRecord {
            id: Some("D1".into()),
            title: Some("Sales growth".into()),
            description: Some("Revenue and sales trends".into()),
            dashboard_elements: Some(vec![element("11", "Revenue"), element("12", "Churn")]),
        },
        DashboardRecord {
            id: Some("D2".into()),
            title: Some("Ops".into()),
            description: Some("Service latency".into()),
            dashboard_elements: Some(vec![element("21", "Latency")]),
        },
        DashboardRecord {
            id: Some("D3".into()),
            title: Some("People".into()),
            description: Some("Hiring pipeline".into()),
            dashboard_elements: None,
        },
    ])
}
