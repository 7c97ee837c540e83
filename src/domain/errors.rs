//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("AI completion failed: {0}")]
    Ai(String),

    #[error("CRM error: {0}")]
    Crm(String),

    /// A sentinel item (raw model output or extraction error) reached the sink.
    #[error("Action item is not structured: {0}")]
    UnstructuredItem(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("UI error: {0}")]
    Ui(String),
}
