//! Application use cases. Orchestrate domain logic via ports.

pub mod bulk_deletion_service;
pub mod completion_service;
pub mod crm_admin_service;
pub mod extraction_service;
pub mod pipeline_service;
pub mod sample_transcript_service;
pub mod task_sink;

pub use bulk_deletion_service::BulkDeletionService;
pub use completion_service::CompletionService;
pub use crm_admin_service::CrmAdminService;
pub use extraction_service::ExtractionService;
pub use pipeline_service::PipelineService;
pub use sample_transcript_service::SampleTranscriptService;
pub use task_sink::TaskSinkService;
