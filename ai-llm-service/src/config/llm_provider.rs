use std::fmt;
use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Backend used for LLM inference or embeddings.
///
/// Parsed from `LLM_KIND` / `EMBEDDING_KIND`; matching is case-insensitive and
/// accepts a few common aliases (`claude`, `chatgpt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime.
    Ollama,
    /// OpenAI REST API (chat completions + embeddings).
    OpenAI,
    /// Anthropic Messages API. Has no embeddings endpoint.
    Anthropic,
}

impl LlmProvider {
    /// Whether the provider exposes an embeddings endpoint.
    pub fn supports_embeddings(self) -> bool {
        !matches!(self, LlmProvider::Anthropic)
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LlmProvider::Ollama => "ollama",
            LlmProvider::OpenAI => "openai",
            LlmProvider::Anthropic => "anthropic",
        };
        f.write_str(s)
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "openai" | "chatgpt" => Ok(LlmProvider::OpenAI),
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}
