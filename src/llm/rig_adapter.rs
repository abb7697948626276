//! Bridges rig-core's `CompletionModel` to our `LlmProvider` port.

use async_trait::async_trait;
use rig::completion::{AssistantContent, CompletionModel, Message};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};

/// Adapter wrapping any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

/// Split our flat message list into rig's (preamble, history, prompt) shape.
///
/// System messages are merged into the preamble. The last user message is
/// the prompt; everything before it is history.
fn split_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<Message>, String) {
    let preamble: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let preamble = if preamble.is_empty() {
        None
    } else {
        Some(preamble.join("\n\n"))
    };

    let mut turns: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != Role::System).collect();
    let prompt = match turns.last() {
        Some(last) if last.role == Role::User => {
            let content = last.content.clone();
            turns.pop();
            content
        }
        _ => String::new(),
    };

    let history = turns
        .into_iter()
        .map(|m| match m.role {
            Role::Assistant => Message::assistant(m.content.clone()),
            _ => Message::user(m.content.clone()),
        })
        .collect();

    (preamble, history, prompt)
}

/// Map a rig error string onto our error taxonomy.
fn classify_error(provider: &str, reason: String) -> LlmError {
    let lower = reason.to_lowercase();
    if lower.contains("401") || lower.contains("unauthorized") || lower.contains("authentication")
    {
        LlmError::AuthFailed {
            provider: provider.to_string(),
        }
    } else if lower.contains("429") || lower.contains("rate limit") {
        LlmError::RateLimited {
            provider: provider.to_string(),
            retry_after: None,
        }
    } else {
        LlmError::RequestFailed {
            provider: provider.to_string(),
            reason,
        }
    }
}

/// rig doesn't surface a provider-neutral stop reason, so infer truncation
/// from usage reaching the requested cap.
fn finish_reason(output_tokens: u32, max_tokens: Option<u32>) -> FinishReason {
    match max_tokens {
        Some(cap) if output_tokens >= cap => FinishReason::Length,
        _ => FinishReason::Stop,
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (preamble, history, prompt) = split_messages(&request.messages);
        let max_tokens = request.max_tokens;
        if prompt.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.model_name.clone(),
                reason: "request has no trailing user message".to_string(),
            });
        }

        let mut builder = self.model.completion_request(Message::user(prompt));
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if !history.is_empty() {
            builder = builder.messages(history);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(&self.model_name, e.to_string()))?;

        let content: String = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(text) => Some(text.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        let output_tokens = u32::try_from(response.usage.output_tokens).unwrap_or(u32::MAX);
        Ok(CompletionResponse {
            content,
            input_tokens: u32::try_from(response.usage.input_tokens).unwrap_or(u32::MAX),
            output_tokens,
            finish_reason: finish_reason(output_tokens, max_tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_moves_system_to_preamble() {
        let messages = vec![
            ChatMessage::system("You are an HR assistant."),
            ChatMessage::user("Employee Name: Jane"),
        ];
        let (preamble, history, prompt) = split_messages(&messages);
        assert_eq!(preamble.as_deref(), Some("You are an HR assistant."));
        assert!(history.is_empty());
        assert_eq!(prompt, "Employee Name: Jane");
    }

    #[test]
    fn split_keeps_earlier_turns_as_history() {
        let messages = vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("second"),
        ];
        let (preamble, history, prompt) = split_messages(&messages);
        assert!(preamble.is_none());
        assert_eq!(history.len(), 2);
        assert_eq!(prompt, "second");
    }

    #[test]
    fn split_without_trailing_user_has_empty_prompt() {
        let messages = vec![ChatMessage::assistant("dangling")];
        let (_, history, prompt) = split_messages(&messages);
        assert!(prompt.is_empty());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn usage_at_cap_reads_as_truncated() {
        assert_eq!(finish_reason(1024, Some(1024)), FinishReason::Length);
        assert_eq!(finish_reason(87, Some(1024)), FinishReason::Stop);
        assert_eq!(finish_reason(5000, None), FinishReason::Stop);
    }

    #[test]
    fn classify_auth_and_rate_limit() {
        assert!(matches!(
            classify_error("anthropic", "HTTP 401 Unauthorized".into()),
            LlmError::AuthFailed { .. }
        ));
        assert!(matches!(
            classify_error("anthropic", "429 rate limit exceeded".into()),
            LlmError::RateLimited { .. }
        ));
        assert!(matches!(
            classify_error("anthropic", "connection reset".into()),
            LlmError::RequestFailed { .. }
        ));
    }
}
