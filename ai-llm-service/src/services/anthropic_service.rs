//! Anthropic Messages API client (non-streaming).
//!
//! - `POST {endpoint}/v1/messages` with `x-api-key` and `anthropic-version`
//!
//! The API has no embeddings endpoint; pair it with an OpenAI or Ollama
//! embedding profile.

use std::time::Instant;

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, is_http_endpoint,
        make_snippet,
    },
    usage::{LlmResponse, LlmUsage},
};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Thin client for the Anthropic Messages API.
#[derive(Debug)]
pub struct AnthropicService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_messages: String,
}

impl AnthropicService {
    /// Creates a new [`AnthropicService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider`, `MissingApiKey`, `InvalidEndpoint` on bad config
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Anthropic {
            return Err(
                ProviderError::new(Provider::Anthropic, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::Anthropic, ProviderErrorKind::MissingApiKey)
        })?;

        if !is_http_endpoint(&cfg.endpoint) {
            return Err(ProviderError::new(
                Provider::Anthropic,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "x-api-key",
            header::HeaderValue::from_str(&api_key).map_err(|e| {
                ProviderError::new(
                    Provider::Anthropic,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let timeout = cfg.request_timeout(120);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_messages = format!(
            "{}/v1/messages",
            cfg.endpoint.trim().trim_end_matches('/')
        );

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "AnthropicService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_messages,
        })
    }

    /// Sends one user message (plus optional system prompt) and returns the
    /// concatenated text blocks of the reply.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<LlmResponse, AiLlmError> {
        let started = Instant::now();
        let body = MessagesRequest::from_cfg(&self.cfg, prompt, system);

        debug!(prompt_len = prompt.len(), "POST {}", self.url_messages);
        let resp = self
            .client
            .post(&self.url_messages)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(
                %status,
                url = %self.url_messages,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "Anthropic /v1/messages returned non-success status"
            );
            return Err(ProviderError::new(
                Provider::Anthropic,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url: self.url_messages.clone(),
                    snippet,
                }),
            )
            .into());
        }

        let out: MessagesResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Anthropic,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected `content[].text`")),
            )
        })?;

        let (content, usage) = out.into_parts();
        if content.trim().is_empty() {
            return Err(
                ProviderError::new(Provider::Anthropic, ProviderErrorKind::EmptyChoices).into(),
            );
        }

        info!(
            latency_ms = started.elapsed().as_millis(),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "message completed"
        );

        Ok(LlmResponse::new(content, usage))
    }
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [UserMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

impl<'a> MessagesRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        Self {
            model: &cfg.model,
            max_tokens: cfg.max_tokens.unwrap_or(4096),
            system,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
            temperature: cfg.temperature,
            top_p: cfg.top_p,
        }
    }
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
}

impl MessagesResponse {
    fn into_parts(self) -> (String, LlmUsage) {
        let text = self
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");
        let usage = self
            .usage
            .map(|u| LlmUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();
        (text, usage)
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Anthropic,
            model: "claude-sonnet-4-5".into(),
            endpoint: "https://api.anthropic.com".into(),
            api_key: Some("sk-ant-test".into()),
            max_tokens: None,
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn request_defaults_max_tokens_and_keeps_system_top_level() {
        let c = cfg();
        let req = MessagesRequest::from_cfg(&c, "describe", Some("you are terse"));
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["max_tokens"], 4096);
        assert_eq!(v["system"], "you are terse");
        assert_eq!(v["messages"][0]["role"], "user");
    }

    #[test]
    fn response_joins_text_blocks_and_reads_usage() {
        let raw = r#"{
            "content": [
                {"type": "text", "text": "{\"a\":"},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "1}"}
            ],
            "usage": {"input_tokens": 11, "output_tokens": 7}
        }"#;
        let out: MessagesResponse = serde_json::from_str(raw).unwrap();
        let (text, usage) = out.into_parts();
        assert_eq!(text, "{\"a\":1}");
        assert_eq!(usage, LlmUsage::new(11, 7));
    }

    #[test]
    fn constructor_requires_api_key() {
        let mut c = cfg();
        c.api_key = None;
        assert!(AnthropicService::new(c).is_err());
    }
}
