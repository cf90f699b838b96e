use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{MatchError, Result};
use crate::providers::{Provider, ResolvedProvider};

/// The "embed text" capability
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed one text. An empty vector is never returned as `Ok`.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;
}

/// HTTP embedding backend (OpenAI, Gemini or Ollama)
pub struct EmbeddingProvider {
    provider: Provider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl EmbeddingProvider {
    pub fn new(resolved: &ResolvedProvider) -> Self {
        Self {
            provider: resolved.provider,
            endpoint: resolved.endpoint.trim_end_matches('/').to_string(),
            model: resolved.model.clone(),
            api_key: resolved.api_key.clone(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }

    async fn embed_openai(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Deserialize)]
        struct EmbeddingResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }

        let mut req = self
            .client
            .post(format!("{}/embeddings", self.endpoint))
            .json(&serde_json::json!({
                "model": self.model,
                "input": text,
            }));
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let response = req.send().await?;
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MatchError::Embedding(format!("OpenAI API error: {}", text)));
        }

        let result: EmbeddingResponse = response.json().await?;
        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(MatchError::EmptyEmbedding)
    }

    async fn embed_gemini(&self, text: &str) -> Result<Vec<f32>> {
        let key = self.api_key.as_deref().unwrap_or_default();
        let response = self
            .client
            .post(format!(
                "{}/models/{}:embedContent?key={}",
                self.endpoint, self.model, key
            ))
            .json(&serde_json::json!({
                "model": format!("models/{}", self.model),
                "content": {
                    "parts": [{
                        "text": text
                    }]
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MatchError::Embedding(format!("Gemini API error: {}", text)));
        }

        let result: serde_json::Value = response.json().await?;
        let embedding: Vec<f32> = result
            .get("embedding")
            .and_then(|e| e.get("values").or_else(|| e.get("value")))
            .and_then(|v| v.as_array())
            .ok_or_else(|| MatchError::Embedding("Invalid Gemini embedding response".into()))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        Ok(embedding)
    }

    async fn embed_ollama(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.endpoint))
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": text,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MatchError::Embedding(format!("Ollama API error: {}", text)));
        }

        let result: serde_json::Value = response.json().await?;
        let embedding: Vec<f32> = result
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| MatchError::Embedding("Invalid Ollama embedding response".into()))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        Ok(embedding)
    }
}

#[async_trait]
impl TextEmbedder for EmbeddingProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = match self.provider {
            Provider::OpenAI => self.embed_openai(text).await?,
            Provider::Gemini => self.embed_gemini(text).await?,
            Provider::Ollama => self.embed_ollama(text).await?,
            Provider::Anthropic => {
                return Err(MatchError::Config(
                    "Anthropic has no embedding API".into(),
                ))
            }
        };

        if embedding.is_empty() {
            return Err(MatchError::EmptyEmbedding);
        }
        Ok(embedding)
    }
}
