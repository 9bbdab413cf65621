//! LLM boundary for the workspace: provider configs, Anthropic / OpenAI /
//! Ollama clients, the shared profile service, health probes and tracing setup.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;
pub mod telemetry;
pub mod usage;

pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::{AiLlmError, Result};
pub use health_service::HealthStatus;
pub use service_profiles::LlmServiceProfiles;
pub use usage::{LlmResponse, LlmUsage};
