// Library interface for dashmatch

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod llm;
pub mod providers;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::Config;
pub use error::{MatchError, Result};
