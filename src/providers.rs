use crate::error::{MatchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAI,
    Ollama,
    Gemini,
}

impl Provider {
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Ollama => "http://localhost:11434",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    /// Default text generation model
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-sonnet-4-5-20250929",
            Provider::OpenAI => "gpt-4o-mini",
            Provider::Ollama => "gemma3:4b",
            Provider::Gemini => "gemini-1.5-flash",
        }
    }

    /// Default embedding model, `None` if the provider has no embedding API
    pub fn default_embedding_model(&self) -> Option<&'static str> {
        match self {
            Provider::Anthropic => None,
            Provider::OpenAI => Some("text-embedding-3-small"),
            Provider::Ollama => Some("nomic-embed-text"),
            Provider::Gemini => Some("text-embedding-004"),
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Generate => true,
            Capability::Embed => self.default_embedding_model().is_some(),
        }
    }

    pub fn requires_auth(&self) -> bool {
        match self {
            Provider::Anthropic | Provider::OpenAI | Provider::Gemini => true,
            Provider::Ollama => false,
        }
    }

    pub fn env_var_name(&self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Ollama => "",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Anthropic => "Anthropic (Claude)",
            Provider::OpenAI => "OpenAI",
            Provider::Ollama => "Ollama (local)",
            Provider::Gemini => "Google Gemini",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Provider> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Some(Provider::Anthropic),
            "openai" | "gpt" => Some(Provider::OpenAI),
            "ollama" | "local" => Some(Provider::Ollama),
            "gemini" | "google" | "palm" => Some(Provider::Gemini),
            _ => None,
        }
    }
}

/// A fully resolved backend configuration; no further lookups needed.
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    pub provider: Provider,
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// Which capability a provider is being resolved for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Embed,
    Generate,
}

/// Per-capability overrides read from the config file
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Resolve the active provider for one capability:
/// explicit CLI arg > env API keys > config file > Ollama fallback.
///
/// An explicit provider that lacks the capability (Anthropic has no
/// embedding API) is skipped for that capability only.
pub fn resolve_provider(
    capability: Capability,
    explicit: Option<&str>,
    settings: &ProviderSettings,
) -> Result<ResolvedProvider> {
    if let Some(name) = explicit {
        let provider = Provider::from_str_loose(name)
            .ok_or_else(|| MatchError::Config(format!("Unknown provider: {}", name)))?;
        if provider.supports(capability) {
            return resolve_for_provider(capability, provider, settings);
        }
        tracing::debug!(
            provider = provider.display_name(),
            ?capability,
            "explicit provider lacks capability, falling back"
        );
    }

    if let Some(provider) = detect_from_env(capability) {
        return resolve_for_provider(capability, provider, settings);
    }

    if let Some(ref name) = settings.provider {
        if let Some(provider) = Provider::from_str_loose(name) {
            return resolve_for_provider(capability, provider, settings);
        }
    }

    resolve_for_provider(capability, Provider::Ollama, settings)
}

fn resolve_for_provider(
    capability: Capability,
    provider: Provider,
    settings: &ProviderSettings,
) -> Result<ResolvedProvider> {
    // Settings only apply when they were written for this provider
    let own = settings
        .provider
        .as_deref()
        .and_then(Provider::from_str_loose)
        .map(|p| p == provider)
        .unwrap_or(true);

    let api_key = if !provider.env_var_name().is_empty() {
        std::env::var(provider.env_var_name()).ok()
    } else {
        None
    }
    .or_else(|| own.then(|| settings.api_key.clone()).flatten());

    let endpoint = own
        .then(|| settings.endpoint.clone())
        .flatten()
        .unwrap_or_else(|| provider.default_endpoint().to_string());

    let default_model = match capability {
        Capability::Generate => provider.default_model(),
        Capability::Embed => provider.default_embedding_model().ok_or_else(|| {
            MatchError::Config(format!(
                "{} has no embedding API; pick openai, gemini or ollama",
                provider.display_name()
            ))
        })?,
    };
    let model = own
        .then(|| settings.model.clone())
        .flatten()
        .unwrap_or_else(|| default_model.to_string());

    if provider.requires_auth() && api_key.is_none() {
        return Err(MatchError::Config(format!(
            "No API key found for {}. Set {} or add api_key to the config file",
            provider.display_name(),
            provider.env_var_name(),
        )));
    }

    Ok(ResolvedProvider {
        provider,
        endpoint,
        model,
        api_key,
    })
}

fn detect_from_env(capability: Capability) -> Option<Provider> {
    if capability == Capability::Generate && std::env::var("ANTHROPIC_API_KEY").is_ok() {
        return Some(Provider::Anthropic);
    }
    if std::env::var("GEMINI_API_KEY").is_ok() {
        return Some(Provider::Gemini);
    }
    if std::env::var("OPENAI_API_KEY").is_ok() {
        return Some(Provider::OpenAI);
    }
    None
}
