//! Default LLM configs loaded strictly from environment variables.
//!
//! Convenience constructors for [`LlmModelConfig`], grouped by provider and
//! role:
//!
//! - **Slow**      → high-quality model (solution assembly)
//! - **Fast**      → cheaper model (follow-up questions); falls back to slow
//! - **Embedding** → embedding generator
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`       = `anthropic` | `openai` | `ollama` (unset → no chat profile)
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//! - `EMBEDDING_KIND` = `openai` | `ollama` | `none` (unset → `openai` when
//!   `OPENAI_API_KEY` is present, otherwise `none`)
//! - `EMBEDDING_MODEL` = embedding model (default `text-embedding-3-small`)
//!
//! Anthropic: `ANTHROPIC_API_KEY` (required), `ANTHROPIC_MODEL`, `ANTHROPIC_URL`.
//!
//! OpenAI: `OPENAI_API_KEY` (required), `OPENAI_MODEL`, `OPENAI_MODEL_FAST`,
//! `OPENAI_URL`.
//!
//! Ollama: `OLLAMA_URL` or `OLLAMA_PORT`, `OLLAMA_MODEL` (required),
//! `OLLAMA_MODEL_FAST`.

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, Result, env_opt_u32, must_env, opt_env, validate_http_endpoint,
    },
};

pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// The Messages API rejects requests without `max_tokens`.
const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 4096;

/// Chat profiles resolved from `LLM_KIND`.
#[derive(Debug, Clone, Default)]
pub struct ChatProfiles {
    pub fast: Option<LlmModelConfig>,
    pub slow: Option<LlmModelConfig>,
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// # Errors
///
/// - [`ConfigError::MissingVar`] if both are missing
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint() -> Result<String> {
    if let Some(url) = opt_env("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = opt_env("OLLAMA_PORT") {
        port.trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{}", port.trim()));
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

fn hosted_endpoint(var: &'static str, default: &str) -> Result<String> {
    let url = opt_env(var).unwrap_or_else(|| default.to_string());
    validate_http_endpoint(var, &url)?;
    Ok(url)
}

/// Anthropic profile used for both fast and slow roles.
///
/// # Env
/// - `ANTHROPIC_API_KEY` (required)
/// - `ANTHROPIC_MODEL`, `ANTHROPIC_URL`, `LLM_MAX_TOKENS` (optional)
pub fn config_anthropic_chat() -> Result<LlmModelConfig> {
    let api_key = must_env("ANTHROPIC_API_KEY")?;
    let endpoint = hosted_endpoint("ANTHROPIC_URL", DEFAULT_ANTHROPIC_URL)?;
    let model = opt_env("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.into());
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?.or(Some(ANTHROPIC_DEFAULT_MAX_TOKENS));

    Ok(LlmModelConfig {
        provider: LlmProvider::Anthropic,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(180),
    })
}

/// OpenAI chat profile.
///
/// `fast = true` reads `OPENAI_MODEL_FAST` first and falls back to
/// `OPENAI_MODEL`.
///
/// # Env
/// - `OPENAI_API_KEY` (required)
/// - `OPENAI_MODEL`, `OPENAI_MODEL_FAST`, `OPENAI_URL`, `LLM_MAX_TOKENS` (optional)
pub fn config_openai_chat(fast: bool) -> Result<LlmModelConfig> {
    let api_key = must_env("OPENAI_API_KEY")?;
    let endpoint = hosted_endpoint("OPENAI_URL", DEFAULT_OPENAI_URL)?;
    let main = opt_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into());
    let model = if fast {
        opt_env("OPENAI_MODEL_FAST").unwrap_or(main)
    } else {
        main
    };

    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(if fast { 0.4 } else { 0.2 }),
        top_p: None,
        timeout_secs: Some(180),
    })
}

/// Constructs a config for the **slow/quality** Ollama model.
///
/// # Env
/// - `OLLAMA_MODEL` (required)
/// - `LLM_MAX_TOKENS` (optional)
pub fn config_ollama_slow() -> Result<LlmModelConfig> {
    let endpoint = ollama_endpoint()?;
    let model = must_env("OLLAMA_MODEL")?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        max_tokens,
        temperature: Some(0.2),
        top_p: None,
        timeout_secs: Some(600),
    })
}

/// Constructs a config for the **fast** Ollama model.
///
/// # Env
/// - `OLLAMA_MODEL_FAST` (optional, falls back to `OLLAMA_MODEL`)
/// - `LLM_MAX_TOKENS` (optional)
pub fn config_ollama_fast() -> Result<LlmModelConfig> {
    let endpoint = ollama_endpoint()?;
    let model = match opt_env("OLLAMA_MODEL_FAST") {
        Some(m) => m,
        None => must_env("OLLAMA_MODEL")?,
    };
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        max_tokens,
        temperature: Some(0.5),
        top_p: Some(0.9),
        timeout_secs: Some(600),
    })
}

/// Constructs a config for the **embedding** model of the given provider.
///
/// # Env
/// - `EMBEDDING_MODEL` (default `text-embedding-3-small`)
/// - OpenAI: `OPENAI_API_KEY` (required), `OPENAI_URL`
/// - Ollama: `OLLAMA_URL` / `OLLAMA_PORT`
///
/// # Errors
/// [`ConfigError::UnsupportedProvider`] for providers without embeddings.
pub fn config_embedding(provider: LlmProvider) -> Result<LlmModelConfig> {
    let model = opt_env("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.into());
    let (endpoint, api_key) = match provider {
        LlmProvider::OpenAI => (
            hosted_endpoint("OPENAI_URL", DEFAULT_OPENAI_URL)?,
            Some(must_env("OPENAI_API_KEY")?),
        ),
        LlmProvider::Ollama => (ollama_endpoint()?, None),
        LlmProvider::Anthropic => {
            return Err(ConfigError::UnsupportedProvider(
                "anthropic has no embeddings endpoint".into(),
            )
            .into());
        }
    };

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(30),
    })
}

/// Resolves chat profiles from `LLM_KIND`.
///
/// An unset `LLM_KIND` yields empty profiles: the service then reports itself
/// as not initialized instead of failing at startup.
pub fn chat_profiles_from_env() -> Result<ChatProfiles> {
    let Some(kind) = opt_env("LLM_KIND") else {
        return Ok(ChatProfiles::default());
    };
    let provider: LlmProvider = kind.parse()?;

    let (fast, slow) = match provider {
        LlmProvider::Anthropic => {
            let cfg = config_anthropic_chat()?;
            (cfg.clone(), cfg)
        }
        LlmProvider::OpenAI => (config_openai_chat(true)?, config_openai_chat(false)?),
        LlmProvider::Ollama => (config_ollama_fast()?, config_ollama_slow()?),
    };

    Ok(ChatProfiles {
        fast: Some(fast),
        slow: Some(slow),
    })
}

/// Resolves the embedding profile from `EMBEDDING_KIND`.
pub fn embedding_profile_from_env() -> Result<Option<LlmModelConfig>> {
    let kind = match opt_env("EMBEDDING_KIND") {
        Some(k) => k,
        None if opt_env("OPENAI_API_KEY").is_some() => "openai".to_string(),
        None => return Ok(None),
    };
    if kind.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let provider: LlmProvider = kind.parse()?;
    config_embedding(provider).map(Some)
}
