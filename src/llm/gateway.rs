//! LLM gateway, the single call site the onboarding stages use.
//!
//! Wraps an `LlmProvider` with the request defaults and per-call timeout from
//! [`GatewayConfig`]. There is no retry here: a failed call is returned to the
//! caller as-is.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, FinishReason, LlmProvider};

/// Instruction appended to the system prompt for structured calls.
const STRUCTURED_INSTRUCTION: &str = "Respond with a single JSON object using double quotes. \
     Do not include any explanation or text outside the JSON.";

/// Prompt-in, text-out access to a model.
#[derive(Clone)]
pub struct LlmGateway {
    llm: Arc<dyn LlmProvider>,
    config: GatewayConfig,
}

impl LlmGateway {
    pub fn new(llm: Arc<dyn LlmProvider>, config: GatewayConfig) -> Self {
        Self { llm, config }
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Send a rendered prompt and return the model's raw text.
    pub async fn invoke(&self, prompt: &[ChatMessage]) -> Result<String, LlmError> {
        self.send(prompt.to_vec()).await
    }

    /// Like [`invoke`](Self::invoke), but asks the model for a JSON object
    /// shaped like `schema_hint`. The answer is still returned as raw text;
    /// parsing is the caller's job.
    pub async fn invoke_structured(
        &self,
        prompt: &[ChatMessage],
        schema_hint: &str,
    ) -> Result<String, LlmError> {
        let mut messages = prompt.to_vec();
        messages.push(ChatMessage::system(format!(
            "{STRUCTURED_INSTRUCTION}\nExpected shape: {schema_hint}"
        )));
        self.send(messages).await
    }

    async fn send(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        let request = CompletionRequest::new(messages)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let response = tokio::time::timeout(self.config.timeout, self.llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: self.llm.model_name().to_string(),
                timeout: self.config.timeout,
            })??;

        debug!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "LLM call completed"
        );
        if response.finish_reason == FinishReason::Length {
            warn!(
                model = self.llm.model_name(),
                max_tokens = self.config.max_tokens,
                "LLM answer hit the token cap and may be truncated"
            );
        }
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::llm::provider::{CompletionResponse, Role};

    /// Records every request and answers with a fixed string.
    struct RecordingLlm {
        seen: Mutex<Vec<CompletionRequest>>,
        delay: Duration,
        finish_reason: FinishReason,
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        fn model_name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.seen.lock().unwrap().push(request);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(CompletionResponse {
                content: "ok".into(),
                input_tokens: 1,
                output_tokens: 1,
                finish_reason: self.finish_reason,
            })
        }
    }

    fn recording(delay: Duration) -> Arc<RecordingLlm> {
        Arc::new(RecordingLlm {
            seen: Mutex::new(Vec::new()),
            delay,
            finish_reason: FinishReason::Stop,
        })
    }

    #[tokio::test]
    async fn invoke_applies_config_defaults() {
        let llm = recording(Duration::ZERO);
        let gateway = LlmGateway::new(llm.clone(), GatewayConfig::default());

        let text = gateway.invoke(&[ChatMessage::user("hello")]).await.unwrap();
        assert_eq!(text, "ok");

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature, Some(GatewayConfig::default().temperature));
        assert_eq!(seen[0].max_tokens, Some(GatewayConfig::default().max_tokens));
        assert_eq!(seen[0].messages.len(), 1);
    }

    #[tokio::test]
    async fn invoke_structured_adds_schema_hint() {
        let llm = recording(Duration::ZERO);
        let gateway = LlmGateway::new(llm.clone(), GatewayConfig::default());

        gateway
            .invoke_structured(&[ChatMessage::user("plan")], r#"{"training_requirements": []}"#)
            .await
            .unwrap();

        let seen = llm.seen.lock().unwrap();
        let last = seen[0].messages.last().unwrap();
        assert_eq!(last.role, Role::System);
        assert!(last.content.contains("training_requirements"));
    }

    #[tokio::test]
    async fn truncated_answer_is_still_returned() {
        let llm = Arc::new(RecordingLlm {
            seen: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            finish_reason: FinishReason::Length,
        });
        let gateway = LlmGateway::new(llm, GatewayConfig::default());

        let text = gateway.invoke(&[ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let llm = recording(Duration::from_millis(200));
        let config = GatewayConfig {
            timeout: Duration::from_millis(10),
            ..Default::default()
        };
        let gateway = LlmGateway::new(llm, config);

        let err = gateway.invoke(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout { .. }));
    }
}
