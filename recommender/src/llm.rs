//! LLM boundary used by the pipeline.

use ai_llm_service::{AiLlmError, LlmResponse, LlmServiceProfiles};
use futures::future::BoxFuture;

/// Chat completion client.
pub trait LlmClient: Send + Sync {
    /// `false` when no chat provider is configured.
    fn is_initialized(&self) -> bool;

    fn send_message<'a>(
        &'a self,
        prompt: &'a str,
        system: Option<&'a str>,
    ) -> BoxFuture<'a, Result<LlmResponse, AiLlmError>>;
}

/// Recommendations run on the slow (reasoning) profile.
impl LlmClient for LlmServiceProfiles {
    fn is_initialized(&self) -> bool {
        LlmServiceProfiles::is_initialized(self)
    }

    fn send_message<'a>(
        &'a self,
        prompt: &'a str,
        system: Option<&'a str>,
    ) -> BoxFuture<'a, Result<LlmResponse, AiLlmError>> {
        Box::pin(self.generate_slow(prompt, system))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_profiles_report_not_initialized() {
        let profiles = LlmServiceProfiles::new(None, None, None, None).unwrap();
        let client: &dyn LlmClient = &profiles;
        assert!(!client.is_initialized());
        let err = client.send_message("hi", None).await.unwrap_err();
        assert!(err.to_string().contains("AI provider is not initialized"));
    }
}
