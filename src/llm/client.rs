use async_trait::async_trait;

use super::{Candidate, Generation, TextGenerator};
use crate::error::{MatchError, Result};
use crate::providers::{Provider, ResolvedProvider};

/// Multi-provider text generation client
pub struct LlmClient {
    provider: Provider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

fn candidates<'a>(texts: impl Iterator<Item = &'a str>) -> Generation {
    Generation {
        candidates: texts
            .map(|output| Candidate {
                output: output.to_string(),
            })
            .collect(),
    }
}

impl LlmClient {
    pub fn new(resolved: &ResolvedProvider) -> Self {
        Self {
            provider: resolved.provider,
            endpoint: resolved.endpoint.trim_end_matches('/').to_string(),
            model: resolved.model.clone(),
            api_key: resolved.api_key.clone(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<serde_json::Value> {
        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MatchError::Llm(format!("{}: {}", status, text)));
        }
        Ok(response.json().await?)
    }

    /// Gemini generateContent API
    async fn generate_gemini(&self, prompt: &str) -> Result<Generation> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint,
            self.model,
            self.api_key.as_deref().unwrap_or_default()
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.3 },
        });

        let json = self.send(self.client.post(&url).json(&body)).await?;
        let texts = json
            .get("candidates")
            .and_then(|c| c.as_array())
            .into_iter()
            .flatten()
            .filter_map(|c| {
                c.get("content")
                    .and_then(|c| c.get("parts"))
                    .and_then(|p| p.get(0))
                    .and_then(|p| p.get("text"))
                    .and_then(|t| t.as_str())
            });
        Ok(candidates(texts))
    }

    /// Anthropic Messages API
    async fn generate_anthropic(&self, prompt: &str) -> Result<Generation> {
        let url = format!("{}/v1/messages", self.endpoint);
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": 512,
            "messages": [
                { "role": "user", "content": prompt },
            ],
            "temperature": 0.3,
        });

        let mut req = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req
                .header("x-api-key", key)
                .header("anthropic-version", "2023-06-01");
        }

        let json = self.send(req).await?;
        let texts = json
            .get("content")
            .and_then(|c| c.as_array())
            .into_iter()
            .flatten()
            .filter_map(|b| b.get("text").and_then(|t| t.as_str()));
        Ok(candidates(texts))
    }

    /// OpenAI chat completions
    async fn generate_openai(&self, prompt: &str) -> Result<Generation> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt },
            ],
            "temperature": 0.3,
            "max_tokens": 512,
        });

        let mut req = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let json = self.send(req).await?;
        let texts = json
            .get("choices")
            .and_then(|c| c.as_array())
            .into_iter()
            .flatten()
            .filter_map(|c| {
                c.get("message")
                    .and_then(|m| m.get("content"))
                    .and_then(|c| c.as_str())
            });
        Ok(candidates(texts))
    }

    /// Ollama native generate API
    async fn generate_ollama(&self, prompt: &str) -> Result<Generation> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": 0.3 },
        });

        let json = self.send(self.client.post(&url).json(&body)).await?;
        let texts = json.get("response").and_then(|r| r.as_str()).into_iter();
        Ok(candidates(texts))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate_text(&self, prompt: &str) -> Result<Generation> {
        match self.provider {
            Provider::Gemini => self.generate_gemini(prompt).await,
            Provider::Anthropic => self.generate_anthropic(prompt).await,
            Provider::OpenAI => self.generate_openai(prompt).await,
            Provider::Ollama => self.generate_ollama(prompt).await,
        }
    }
}
