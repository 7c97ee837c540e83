//! Mock AI adapter for running without API calls.
//!
//! Returns a canned action-item answer by default, or replays a script of
//! answers. Records every request so callers can inspect attempts.

use crate::domain::{CompletionRequest, DomainError};
use crate::ports::AiPort;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// Canned answer: a fenced JSON array, the way chat models usually reply.
const CANNED_ACTION_ITEMS: &str = r#"```json
[
  {"description": "[MOCK] Send the list of lead sources", "priority": "high", "deadline": "Friday", "assignee": "Jennifer", "category": "integration"},
  {"description": "[MOCK] Review the drip campaign email templates", "priority": "medium", "deadline": "Wednesday", "assignee": "Jennifer", "category": "feedback"}
]
```"#;

/// How the mock picks its answer.
enum Answers {
    /// [`CANNED_ACTION_ITEMS`] on every call.
    Canned,
    /// Popped in order; `Ok(None)` once exhausted.
    Script(Mutex<VecDeque<Result<Option<String>, DomainError>>>),
    /// The same answer on every call.
    Constant(Option<String>),
}

/// Mock AI adapter.
///
/// Answers with [`CANNED_ACTION_ITEMS`], a script, or a constant, and records
/// every request.
pub struct MockAiAdapter {
    /// Simulated network delay in milliseconds.
    delay_ms: u64,
    answers: Answers,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockAiAdapter {
    /// Create a new mock adapter with default delay (100ms).
    pub fn new() -> Self {
        Self::with_delay(100)
    }

    /// Create a mock adapter with custom delay.
    pub fn with_delay(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            answers: Answers::Canned,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replay the given answers in order, without delay.
    pub fn scripted(answers: Vec<Result<Option<String>, DomainError>>) -> Self {
        Self {
            delay_ms: 0,
            answers: Answers::Script(Mutex::new(answers.into())),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with the same text.
    pub fn always(answer: Option<&str>) -> Self {
        Self {
            delay_ms: 0,
            answers: Answers::Constant(answer.map(str::to_string)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for MockAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AiPort for MockAiAdapter {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, DomainError> {
        info!(
            prompt_len = request.prompt.len(),
            max_tokens = request.max_tokens,
            "[MOCK] Simulating completion"
        );

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        match &self.answers {
            Answers::Canned => Ok(Some(CANNED_ACTION_ITEMS.to_string())),
            Answers::Script(script) => script
                .lock()
                .map_err(|e| DomainError::Ai(format!("mock script poisoned: {}", e)))?
                .pop_front()
                .unwrap_or(Ok(None)),
            Answers::Constant(answer) => Ok(answer.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            prompt: "p".to_string(),
            max_tokens: 512,
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn test_mock_adapter_canned() {
        let adapter = MockAiAdapter::with_delay(10);
        let out = adapter.complete(&request()).await.unwrap().unwrap();

        assert!(out.starts_with("```json"));
        assert!(out.contains("[MOCK]"));
        assert_eq!(adapter.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_adapter_script_then_exhausted() {
        let adapter = MockAiAdapter::scripted(vec![
            Err(DomainError::Ai("down".into())),
            Ok(Some("hello".into())),
        ]);

        assert!(adapter.complete(&request()).await.is_err());
        assert_eq!(
            adapter.complete(&request()).await.unwrap().as_deref(),
            Some("hello")
        );
        assert_eq!(adapter.complete(&request()).await.unwrap(), None);
        assert_eq!(adapter.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_adapter_always_never_runs_out() {
        let adapter = MockAiAdapter::always(Some("same"));
        for _ in 0..100 {
            assert_eq!(
                adapter.complete(&request()).await.unwrap().as_deref(),
                Some("same")
            );
        }
        assert_eq!(adapter.call_count(), 100);
    }
}
