//! Health probes for LLM backends (Ollama, OpenAI, Anthropic).
//!
//! - Ollama:    `GET {endpoint}/api/tags` (best-effort model existence check)
//! - OpenAI:    `GET {endpoint}/v1/models` with Bearer auth
//! - Anthropic: `GET {endpoint}/v1/models` with `x-api-key`
//!
//! [`HealthService::check`] never fails: errors are mapped to `ok=false`.
//! Provider-specific probes (`try_*`) return strict `Result`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, is_http_endpoint, make_snippet};
use crate::services::anthropic_service::ANTHROPIC_VERSION;

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (`ollama`, `openai`, `anthropic`).
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier relevant to the probe.
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the main probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: cfg.provider.to_string(),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// A health checker that reuses a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        debug!(
            default_timeout_secs = timeout.as_secs(),
            "HealthService initialized"
        );

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Checks health for a single config, routing to the provider-specific probe.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        if !is_http_endpoint(&cfg.endpoint) {
            warn!(
                provider = %cfg.provider,
                endpoint = %cfg.endpoint,
                "invalid endpoint (empty or missing http/https)"
            );
            return HealthStatus::new(cfg, false, 0, "endpoint is empty or missing http/https");
        }

        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.try_probe_ollama(cfg).await,
            LlmProvider::OpenAI | LlmProvider::Anthropic => self.try_probe_models(cfg).await,
        };

        match result {
            Ok(status) => {
                info!(
                    profile = %cfg.label(),
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status =
                    HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string());
                warn!(
                    profile = %cfg.label(),
                    latency_ms = status.latency_ms,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// Checks health for multiple configs sequentially.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running batch health probes");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    /// Probes never wait longer than the health client's own timeout.
    fn timeout_for(&self, cfg: &LlmModelConfig) -> Duration {
        cfg.timeout_secs
            .map(Duration::from_secs)
            .map_or(self.default_timeout, |t| t.min(self.default_timeout))
    }

    /// Strict Ollama probe: `GET /api/tags`, then look for `cfg.model`.
    async fn try_probe_ollama(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/api/tags", cfg.endpoint.trim_end_matches('/'));

        let start = Instant::now();
        debug!(provider = "ollama", model = %cfg.model, "GET {}", url);

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout_for(cfg))
            .send()
            .await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            return Err(http_failure(resp, url, latency).await);
        }

        #[derive(Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(Deserialize)]
        struct Tags {
            models: Option<Vec<Tag>>,
        }

        match resp.json::<Tags>().await {
            Ok(Tags {
                models: Some(models),
            }) => {
                // Tags are listed as `name:tag`; a bare model name means `:latest`.
                let wanted = &cfg.model;
                let exists = models.iter().any(|m| {
                    m.name == *wanted || m.name.strip_suffix(":latest") == Some(wanted.as_str())
                });
                Ok(if exists {
                    HealthStatus::new(cfg, true, latency, "Ollama is healthy; model is available")
                } else {
                    HealthStatus::new(
                        cfg,
                        false,
                        latency,
                        "Ollama is up, but model not found in /api/tags",
                    )
                })
            }
            Ok(Tags { models: None }) => Ok(HealthStatus::new(
                cfg,
                true,
                latency,
                "Ollama is healthy; tags response without `models` field",
            )),
            Err(e) => Ok(HealthStatus::new(
                cfg,
                true,
                latency,
                format!("Ollama is reachable; failed to decode /api/tags: {e}"),
            )),
        }
    }

    /// Strict hosted probe: `GET /v1/models`, then look for `cfg.model`.
    ///
    /// Anthropic lists dated snapshots, so a prefix match is accepted.
    async fn try_probe_models(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/v1/models", cfg.endpoint.trim_end_matches('/'));
        let api_key = cfg
            .api_key
            .as_ref()
            .ok_or_else(|| HealthError::Decode(format!("missing {} API key", cfg.provider)))?;

        let mut req = self.client.get(&url).timeout(self.timeout_for(cfg));
        req = match cfg.provider {
            LlmProvider::Anthropic => req
                .header("x-api-key", api_key.as_str())
                .header("anthropic-version", ANTHROPIC_VERSION),
            _ => req.header(header::AUTHORIZATION, format!("Bearer {api_key}")),
        };

        let start = Instant::now();
        debug!(provider = %cfg.provider, model = %cfg.model, "GET {}", url);
        let resp = req.send().await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            return Err(http_failure(resp, url, latency).await);
        }

        #[derive(Deserialize)]
        struct ModelItem {
            id: String,
        }
        #[derive(Deserialize)]
        struct Models {
            data: Vec<ModelItem>,
        }

        match resp.json::<Models>().await {
            Ok(models) => {
                let exists = models
                    .data
                    .iter()
                    .any(|m| m.id == cfg.model || m.id.starts_with(&cfg.model));
                Ok(if exists {
                    HealthStatus::new(cfg, true, latency, "model is available")
                } else {
                    HealthStatus::new(cfg, false, latency, "API is up, but model not listed")
                })
            }
            Err(e) => Ok(HealthStatus::new(
                cfg,
                true,
                latency,
                format!("API is reachable; failed to decode /v1/models: {e}"),
            )),
        }
    }
}

async fn http_failure(resp: reqwest::Response, url: String, latency: u128) -> AiLlmError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let snippet = make_snippet(&text);

    error!(%url, %status, %snippet, latency_ms = latency, "health probe returned non-success status");

    HealthError::HttpStatus(HttpError {
        status,
        url,
        snippet,
    })
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_endpoint_is_reported_not_raised() {
        let svc = HealthService::new(Some(1)).unwrap();
        let cfg = LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: "gpt-4o".into(),
            endpoint: "api.openai.com".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        };
        let status = svc.check(&cfg).await;
        assert!(!status.ok);
        assert_eq!(status.provider, "openai");
        assert_eq!(status.latency_ms, 0);
    }
}
