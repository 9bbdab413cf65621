//! Shared LLM service with three optional profiles: `fast`, `slow`, and `embedding`.
//!
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider+endpoint+model+key+timeout).
//! - `slow` falls back to `fast` and vice versa; with neither the service
//!   reports [`LlmServiceProfiles::is_initialized`] = `false` and generation
//!   fails with [`AiLlmError::NotInitialized`].
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//!
//! # async fn run() -> Result<(), ai_llm_service::error_handler::AiLlmError> {
//! let svc = Arc::new(LlmServiceProfiles::from_env(Some(10))?);
//! let reply = svc.generate_slow("Hello world", None).await?;
//! println!("{} ({} tokens)", reply.content, reply.usage.total());
//! # Ok(()) }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{
    config::{
        default_config::{chat_profiles_from_env, embedding_profile_from_env},
        llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::{AiLlmError, ConfigError},
    health_service::{HealthService, HealthStatus},
    services::{
        anthropic_service::AnthropicService, ollama_service::OllamaService,
        open_ai_service::OpenAiService,
    },
    usage::LlmResponse,
};

/// Shared service that manages the **fast**, **slow**, and **embedding** profiles.
///
/// Provider clients are cached keyed by their configuration so HTTP clients
/// are not rebuilt per call.
pub struct LlmServiceProfiles {
    fast: Option<LlmModelConfig>,
    slow: Option<LlmModelConfig>,
    embedding: Option<LlmModelConfig>,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
    anthropic: RwLock<HashMap<ClientKey, Arc<AnthropicService>>>,

    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates a new service.
    ///
    /// # Errors
    /// - [`ConfigError::UnsupportedProvider`] if `embedding` targets a provider
    ///   without embeddings
    /// - [`AiLlmError::HttpTransport`] if the health client cannot be built
    pub fn new(
        fast: Option<LlmModelConfig>,
        slow: Option<LlmModelConfig>,
        embedding: Option<LlmModelConfig>,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        if let Some(e) = &embedding {
            if !e.provider.supports_embeddings() {
                return Err(ConfigError::UnsupportedProvider(format!(
                    "{} cannot serve embeddings",
                    e.provider
                ))
                .into());
            }
        }

        let fast = fast.or_else(|| slow.clone());
        let slow = slow.or_else(|| fast.clone());

        info!(
            chat = ?slow.as_ref().map(|c| c.provider),
            chat_model = slow.as_ref().map(|c| c.model.as_str()).unwrap_or("none"),
            embedding = ?embedding.as_ref().map(|c| c.provider),
            "LLM profiles configured"
        );

        Ok(Self {
            fast,
            slow,
            embedding,
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
            anthropic: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Builds all profiles from the environment (see `default_config`).
    pub fn from_env(health_timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let chat = chat_profiles_from_env()?;
        let embedding = embedding_profile_from_env()?;
        Self::new(chat.fast, chat.slow, embedding, health_timeout_secs)
    }

    /// `true` when a chat profile is configured.
    pub fn is_initialized(&self) -> bool {
        self.slow.is_some()
    }

    /// `true` when an embedding profile is configured.
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    /// Generates text using the **slow** profile.
    pub async fn generate_slow(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<LlmResponse, AiLlmError> {
        let cfg = self
            .slow
            .as_ref()
            .ok_or(AiLlmError::NotInitialized("no chat profile configured"))?;
        self.generate_with(cfg, prompt, system).await
    }

    /// Computes embeddings using the **embedding** profile.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let cfg = self.embedding_cfg()?;
        match cfg.provider {
            LlmProvider::Ollama => self.get_or_init_ollama(cfg).await?.embeddings(input).await,
            LlmProvider::OpenAI => self.get_or_init_openai(cfg).await?.embeddings(input).await,
            LlmProvider::Anthropic => Err(unsupported_embeddings()),
        }
    }

    /// Computes embeddings for several inputs, preserving order.
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        let cfg = self.embedding_cfg()?;
        match cfg.provider {
            LlmProvider::Ollama => {
                self.get_or_init_ollama(cfg)
                    .await?
                    .embeddings_batch(inputs)
                    .await
            }
            LlmProvider::OpenAI => {
                self.get_or_init_openai(cfg)
                    .await?
                    .embeddings_batch(inputs)
                    .await
            }
            LlmProvider::Anthropic => Err(unsupported_embeddings()),
        }
    }

    /// Returns a health snapshot for all distinct configured profiles.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = Vec::<LlmModelConfig>::with_capacity(3);
        for cfg in [&self.fast, &self.slow, &self.embedding].into_iter().flatten() {
            if !list.contains(cfg) {
                list.push(cfg.clone());
            }
        }
        self.health.check_many(&list).await
    }

    /// Returns the current profiles `(fast, slow, embedding)`.
    pub fn profiles(
        &self,
    ) -> (
        Option<&LlmModelConfig>,
        Option<&LlmModelConfig>,
        Option<&LlmModelConfig>,
    ) {
        (
            self.fast.as_ref(),
            self.slow.as_ref(),
            self.embedding.as_ref(),
        )
    }

    /* --------------------- Internals --------------------- */

    fn embedding_cfg(&self) -> Result<&LlmModelConfig, AiLlmError> {
        self.embedding
            .as_ref()
            .ok_or(AiLlmError::NotInitialized("no embedding profile configured"))
    }

    async fn generate_with(
        &self,
        cfg: &LlmModelConfig,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<LlmResponse, AiLlmError> {
        debug!(provider = %cfg.provider, model = %cfg.model, "dispatching generation");
        match cfg.provider {
            LlmProvider::Ollama => self.get_or_init_ollama(cfg).await?.generate(prompt, system).await,
            LlmProvider::OpenAI => self.get_or_init_openai(cfg).await?.generate(prompt, system).await,
            LlmProvider::Anthropic => {
                self.get_or_init_anthropic(cfg)
                    .await?
                    .generate(prompt, system)
                    .await
            }
        }
    }

    async fn get_or_init_ollama(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_openai(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_anthropic(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<AnthropicService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.anthropic.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.anthropic.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(AnthropicService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

fn unsupported_embeddings() -> AiLlmError {
    ConfigError::UnsupportedProvider("anthropic has no embeddings endpoint".into()).into()
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(provider: LlmProvider, model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider,
            model: model.into(),
            endpoint: "http://localhost:11434".into(),
            api_key: Some("k".into()),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[tokio::test]
    async fn uninitialized_service_reports_not_initialized() {
        let svc = LlmServiceProfiles::new(None, None, None, Some(1)).unwrap();
        assert!(!svc.is_initialized());
        let err = svc.generate_slow("x", None).await.unwrap_err();
        assert!(matches!(err, AiLlmError::NotInitialized(_)));
        let err = svc.embed("x").await.unwrap_err();
        assert!(matches!(err, AiLlmError::NotInitialized(_)));
    }

    #[test]
    fn slow_falls_back_to_fast() {
        let fast = cfg(LlmProvider::Ollama, "small");
        let svc = LlmServiceProfiles::new(Some(fast.clone()), None, None, Some(1)).unwrap();
        let (f, s, _) = svc.profiles();
        assert_eq!(f, Some(&fast));
        assert_eq!(s, Some(&fast));
        assert!(svc.is_initialized());
    }

    #[test]
    fn anthropic_embedding_profile_is_rejected() {
        let e = cfg(LlmProvider::Anthropic, "claude");
        assert!(LlmServiceProfiles::new(None, None, Some(e), Some(1)).is_err());
    }

    #[tokio::test]
    async fn clients_are_cached_per_config() {
        let c = cfg(LlmProvider::Ollama, "m");
        let svc = LlmServiceProfiles::new(Some(c.clone()), None, None, Some(1)).unwrap();
        let a = svc.get_or_init_ollama(&c).await.unwrap();
        let b = svc.get_or_init_ollama(&c).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
