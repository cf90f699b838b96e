use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Embedding request failed: {0}")]
    Embedding(String),

    #[error("Embedding backend returned no vector")]
    EmptyEmbedding,

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("LLM returned empty response")]
    LlmEmptyResponse,

    #[error("{0}")]
    Session(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MatchError>;
