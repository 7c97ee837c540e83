//! Completion client. Single prompt → text, with one stronger-instruction retry.
//!
//! Transport failures are not propagated: they count as "no answer" and end up
//! as the fixed sentinel (or `CompletionOutcome::Failed` for callers that care).

use crate::domain::{CompletionOutcome, CompletionRequest};
use crate::ports::AiPort;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Returned by [`CompletionService::complete`] when both attempts gave nothing.
pub const NO_RESPONSE_SENTINEL: &str = "No response from OpenAI.";

/// Appended to the prompt for the second attempt.
pub const RETRY_INSTRUCTION: &str = "\nPlease respond with a short, non-empty completion.";

pub const FIRST_ATTEMPT_MAX_TOKENS: u32 = 512;
pub const RETRY_MAX_TOKENS: u32 = 256;
pub const TEMPERATURE: f32 = 0.7;

pub struct CompletionService {
    ai: Arc<dyn AiPort>,
}

impl CompletionService {
    pub fn new(ai: Arc<dyn AiPort>) -> Self {
        Self { ai }
    }

    /// Complete a prompt. Never fails: returns [`NO_RESPONSE_SENTINEL`] when
    /// neither attempt produced text.
    pub async fn complete(&self, prompt: &str) -> String {
        match self.try_complete(prompt).await {
            CompletionOutcome::Text(text) => text,
            CompletionOutcome::Empty | CompletionOutcome::Failed(_) => {
                NO_RESPONSE_SENTINEL.to_string()
            }
        }
    }

    /// Complete a prompt, reporting whether an empty result came from the
    /// service itself or from transport failures.
    pub async fn try_complete(&self, prompt: &str) -> CompletionOutcome {
        let mut last_error = None;

        let first = CompletionRequest {
            prompt: prompt.to_string(),
            max_tokens: FIRST_ATTEMPT_MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        if let Some(text) = self.attempt(&first, &mut last_error).await {
            return CompletionOutcome::Text(text);
        }

        info!("empty completion, retrying with stronger instruction");
        let retry = CompletionRequest {
            prompt: format!("{}{}", prompt, RETRY_INSTRUCTION),
            max_tokens: RETRY_MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        if let Some(text) = self.attempt(&retry, &mut last_error).await {
            return CompletionOutcome::Text(text);
        }

        match last_error {
            Some(e) => {
                warn!(error = %e, "completion failed after retry");
                CompletionOutcome::Failed(e)
            }
            None => {
                warn!("completion empty after retry");
                CompletionOutcome::Empty
            }
        }
    }

    /// One attempt. Returns trimmed non-empty text, or `None` (recording the error if any).
    async fn attempt(
        &self,
        request: &CompletionRequest,
        last_error: &mut Option<String>,
    ) -> Option<String> {
        match self.ai.complete(request).await {
            Ok(Some(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                debug!(max_tokens = request.max_tokens, "completion attempt returned no text");
                None
            }
            Err(e) => {
                warn!(max_tokens = request.max_tokens, error = %e, "completion attempt failed");
                *last_error = Some(e.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiAdapter;
    use crate::domain::DomainError;

    #[tokio::test]
    async fn test_first_attempt_text_is_trimmed() {
        let ai = Arc::new(MockAiAdapter::scripted(vec![Ok(Some("  Hola!  \n".into()))]));
        let service = CompletionService::new(ai.clone());

        assert_eq!(service.complete("Hello").await, "Hola!");

        let requests = ai.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "Hello");
        assert_eq!(requests[0].max_tokens, 512);
        assert!((requests[0].temperature - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_whitespace_triggers_retry_with_stronger_prompt() {
        let ai = Arc::new(MockAiAdapter::scripted(vec![
            Ok(Some("   ".into())),
            Ok(Some("Short answer".into())),
        ]));
        let service = CompletionService::new(ai.clone());

        assert_eq!(service.complete("Hello").await, "Short answer");

        let requests = ai.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].prompt,
            "Hello\nPlease respond with a short, non-empty completion."
        );
        assert_eq!(requests[1].max_tokens, 256);
    }

    #[tokio::test]
    async fn test_always_empty_makes_exactly_two_attempts() {
        let ai = Arc::new(MockAiAdapter::always(None));
        let service = CompletionService::new(ai.clone());

        assert_eq!(service.complete("Hello").await, NO_RESPONSE_SENTINEL);
        assert_eq!(ai.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_outcome_distinguished_from_failure() {
        let empty = CompletionService::new(Arc::new(MockAiAdapter::always(Some(""))));
        assert_eq!(empty.try_complete("x").await, CompletionOutcome::Empty);

        let failing = CompletionService::new(Arc::new(MockAiAdapter::scripted(vec![
            Err(DomainError::Ai("HTTP request failed: connection refused".into())),
            Ok(None),
        ])));
        match failing.try_complete("x").await {
            CompletionOutcome::Failed(msg) => assert!(msg.contains("connection refused")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_error_then_text_recovers() {
        let ai = Arc::new(MockAiAdapter::scripted(vec![
            Err(DomainError::Ai("API error 500".into())),
            Ok(Some("ok".into())),
        ]));
        let service = CompletionService::new(ai);
        assert_eq!(
            service.try_complete("x").await,
            CompletionOutcome::Text("ok".into())
        );
    }
}
