//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;

pub use entities::{
    ActionItem, CompletionOutcome, CompletionRequest, DealDeletionReport, DealDeletionStatus,
    ExtractedItem, GeneratedTranscript, Priority, PropertyDefinition, PropertyOption, RecordPage,
    TaskCreationReport, TaskResult,
};
pub use errors::DomainError;
