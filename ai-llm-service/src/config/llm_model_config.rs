use std::time::Duration;

use crate::config::llm_provider::LlmProvider;

/// Configuration for one LLM model invocation profile.
///
/// Holds both general and provider-specific parameters. Profiles are compared
/// by value so the service can skip duplicate health probes.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Anthropic,
///     model: "claude-sonnet-4-5".to_string(),
///     endpoint: "https://api.anthropic.com".to_string(),
///     api_key: Some("sk-ant-...".to_string()),
///     max_tokens: Some(4096),
///     temperature: Some(0.2),
///     top_p: None,
///     timeout_secs: Some(120),
/// };
/// assert_eq!(cfg.provider, LlmProvider::Anthropic);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"gpt-4o"`, `"qwen3:14b"`).
    pub model: String,

    /// Base URL of the provider API (without the `/v1/...` suffix).
    pub endpoint: String,

    /// API key for hosted providers.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Per-request timeout, or `fallback_secs` when the profile leaves it unset.
    pub fn request_timeout(&self, fallback_secs: u64) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(fallback_secs).max(1))
    }

    /// `provider/model`, as it appears in logs and health reports.
    pub fn label(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(timeout_secs: Option<u64>) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "qwen3:14b".into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs,
        }
    }

    #[test]
    fn request_timeout_falls_back_and_never_hits_zero() {
        assert_eq!(cfg(None).request_timeout(60), Duration::from_secs(60));
        assert_eq!(cfg(Some(0)).request_timeout(60), Duration::from_secs(1));
        assert_eq!(cfg(Some(600)).request_timeout(60), Duration::from_secs(600));
    }

    #[test]
    fn label_joins_provider_and_model() {
        assert_eq!(cfg(None).label(), "ollama/qwen3:14b");
    }
}
