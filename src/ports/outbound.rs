//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{CompletionRequest, DomainError};

/// Generative completion service. One request/response exchange per call.
///
/// The retry-on-empty policy lives in `CompletionService`, not here: adapters
/// report exactly what the service answered.
#[async_trait::async_trait]
pub trait AiPort: Send + Sync {
    /// Send a single-turn prompt.
    ///
    /// Returns `Ok(None)` when the service answered without text content.
    ///
    /// # Errors
    /// Returns `DomainError::Ai` on transport, status or deserialization failure.
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, DomainError>;
}
