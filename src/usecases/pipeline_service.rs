//! Pipeline service. Orchestrates transcript → action items → CRM records.
//!
//! Coordinates between the extraction normalizer (AI) and the task sink (CRM),
//! and folds every per-item outcome into one `TaskCreationReport`.

use crate::domain::{ExtractedItem, TaskCreationReport, TaskResult};
use crate::usecases::extraction_service::ExtractionService;
use crate::usecases::task_sink::TaskSinkService;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Service for the full transcript → CRM flow.
///
/// Orchestrates the flow:
/// 1. Extract action items from the transcript
/// 2. Create one CRM record per item (failures isolated per item)
/// 3. Enrich each result with the created record's id/url when parseable
/// 4. Aggregate totals, responses and errors
pub struct PipelineService {
    extraction: Arc<ExtractionService>,
    sink: Arc<TaskSinkService>,
}

/// Fields picked from a CRM create response. Both optional: enrichment is best-effort.
#[derive(Deserialize)]
struct CreatedRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    url: Option<Value>,
}

impl PipelineService {
    pub fn new(extraction: Arc<ExtractionService>, sink: Arc<TaskSinkService>) -> Self {
        Self { extraction, sink }
    }

    /// Extract action items from a transcript and create a CRM record for each.
    ///
    /// Never fails; failures are reported in `errors` and per-item results.
    pub async fn create_tasks_from_transcript(&self, transcript: &str) -> TaskCreationReport {
        let action_items = self.extraction.extract_action_items(transcript).await;
        let outcomes = self.sink.create_tasks_from_action_items(&action_items).await;

        let mut responses = Vec::new();
        let mut errors = Vec::new();
        let mut task_results = Vec::with_capacity(action_items.len());

        for (index, (item, outcome)) in action_items.iter().zip(outcomes).enumerate() {
            match outcome {
                Ok(raw) => {
                    task_results.push(enrich(item, &raw));
                    responses.push(raw);
                }
                Err(e) => {
                    let message = format!("Failed to create task for item {}: {}", index + 1, e);
                    task_results.push(TaskResult {
                        item: item.clone(),
                        sink_raw_response: None,
                        sink_record_id: None,
                        sink_record_url: None,
                        sink_error: Some(message.clone()),
                    });
                    errors.push(message);
                }
            }
        }

        let total_requested = action_items.len();
        let total_failed = errors.len();
        let total_succeeded = total_requested.saturating_sub(total_failed);

        info!(
            total_requested,
            total_succeeded, total_failed, "transcript pipeline complete"
        );

        TaskCreationReport {
            total_requested,
            total_succeeded,
            total_failed,
            responses,
            errors,
            action_items,
            task_results,
        }
    }
}

/// Attach record id/url parsed from the raw CRM response; keep only the raw body otherwise.
fn enrich(item: &ExtractedItem, raw: &str) -> TaskResult {
    let parsed = serde_json::from_str::<CreatedRecord>(raw).ok();
    let as_string = |v: Option<Value>| match v {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    };
    let (id, url) = match parsed {
        Some(record) => (as_string(record.id), as_string(record.url)),
        None => (None, None),
    };

    TaskResult {
        item: item.clone(),
        sink_raw_response: Some(raw.to_string()),
        sink_record_id: id,
        sink_record_url: url,
        sink_error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiAdapter;
    use crate::adapters::integrations::InMemoryCrm;
    use crate::domain::DomainError;
    use crate::shared::config::PropertyNames;
    use crate::usecases::completion_service::CompletionService;

    const TWO_ITEMS: &str = r#"```json
[
  {"description": "Email the lead source list", "priority": "high", "deadline": "Friday", "assignee": "Jennifer"},
  {"description": "Send feedback on templates", "priority": "medium", "deadline": "Wednesday", "assignee": "Jennifer"}
]
```"#;

    fn pipeline(ai: MockAiAdapter, crm: Arc<InMemoryCrm>) -> PipelineService {
        let completion = Arc::new(CompletionService::new(Arc::new(ai)));
        let extraction = Arc::new(ExtractionService::new(completion));
        let sink = Arc::new(TaskSinkService::new(crm, PropertyNames::default()));
        PipelineService::new(extraction, sink)
    }

    #[tokio::test]
    async fn test_two_items_create_two_records_in_order() {
        let crm = Arc::new(InMemoryCrm::new());
        let svc = pipeline(
            MockAiAdapter::scripted(vec![Ok(Some(TWO_ITEMS.into()))]),
            crm.clone(),
        );

        let report = svc.create_tasks_from_transcript("Lisa: ...").await;

        assert_eq!(report.total_requested, 2);
        assert_eq!(report.total_succeeded, 2);
        assert_eq!(report.total_failed, 0);
        assert_eq!(report.responses.len(), 2);
        assert!(report.errors.is_empty());

        let records = crm.records();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].1["ai_systems_description"],
            "Email the lead source list"
        );
        assert_eq!(
            records[1].1["ai_systems_description"],
            "Send feedback on templates"
        );

        assert_eq!(report.task_results[0].sink_record_id.as_deref(), Some("1"));
        assert_eq!(report.task_results[1].sink_record_id.as_deref(), Some("2"));
        assert_eq!(report.task_results[0].sink_record_url, None);
    }

    #[tokio::test]
    async fn test_one_failing_item_keeps_totals_consistent() {
        let crm = Arc::new(InMemoryCrm::new().failing_create(0));
        let svc = pipeline(
            MockAiAdapter::scripted(vec![Ok(Some(TWO_ITEMS.into()))]),
            crm.clone(),
        );

        let report = svc.create_tasks_from_transcript("t").await;

        assert_eq!(report.total_requested, 2);
        assert_eq!(report.total_succeeded, 1);
        assert_eq!(report.total_failed, 1);
        assert_eq!(
            report.total_succeeded + report.total_failed,
            report.total_requested
        );
        assert!(report.errors[0].starts_with("Failed to create task for item 1:"));
        assert!(report.task_results[0].sink_error.is_some());
        assert!(report.task_results[1].sink_raw_response.is_some());
        assert_eq!(crm.records().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_output_is_reported_not_sent() {
        let crm = Arc::new(InMemoryCrm::new());
        let svc = pipeline(
            MockAiAdapter::scripted(vec![Ok(Some("I could not find any tasks.".into()))]),
            crm.clone(),
        );

        let report = svc.create_tasks_from_transcript("t").await;

        assert_eq!(report.total_requested, 1);
        assert_eq!(report.total_failed, 1);
        assert_eq!(report.total_succeeded, 0);
        assert!(report.action_items[0].is_sentinel());
        assert!(crm.records().is_empty());
    }

    #[tokio::test]
    async fn test_no_items_gives_empty_report() {
        let crm = Arc::new(InMemoryCrm::new());
        let svc = pipeline(MockAiAdapter::scripted(vec![Ok(Some("[]".into()))]), crm);

        let report = svc.create_tasks_from_transcript("t").await;

        assert_eq!(report.total_requested, 0);
        assert_eq!(report.total_succeeded, 0);
        assert_eq!(report.total_failed, 0);
        assert!(report.task_results.is_empty());
    }

    #[tokio::test]
    async fn test_ai_outage_never_panics_or_errors() {
        let crm = Arc::new(InMemoryCrm::new());
        let svc = pipeline(
            MockAiAdapter::scripted(vec![
                Err(DomainError::Ai("HTTP request failed".into())),
                Err(DomainError::Ai("HTTP request failed".into())),
            ]),
            crm,
        );

        let report = svc.create_tasks_from_transcript("t").await;

        assert_eq!(report.total_requested, 1);
        assert_eq!(report.total_failed, 1);
        assert!(matches!(
            report.action_items[0],
            ExtractedItem::Error { .. }
        ));
    }

    #[tokio::test]
    async fn test_error_item_result_keeps_both_messages_under_distinct_keys() {
        let crm = Arc::new(InMemoryCrm::new());
        let svc = pipeline(
            MockAiAdapter::scripted(vec![
                Err(DomainError::Ai("dns".into())),
                Err(DomainError::Ai("dns".into())),
            ]),
            crm,
        );

        let report = svc.create_tasks_from_transcript("t").await;
        let json = serde_json::to_string(&report.task_results[0]).unwrap();

        assert_eq!(json.matches(r#""error":"#).count(), 1);
        assert_eq!(json.matches(r#""sinkError":"#).count(), 1);

        let value: Value = serde_json::from_str(&json).unwrap();
        assert!(
            value["error"]
                .as_str()
                .unwrap()
                .starts_with("Failed to extract action items:")
        );
        assert!(
            value["sinkError"]
                .as_str()
                .unwrap()
                .starts_with("Failed to create task for item 1:")
        );
    }

    #[test]
    fn test_enrich_non_json_keeps_raw_only() {
        let item = ExtractedItem::Action(Default::default());
        let result = enrich(&item, "created");
        assert_eq!(result.sink_raw_response.as_deref(), Some("created"));
        assert_eq!(result.sink_record_id, None);

        let result = enrich(&item, r#"{"id": 77, "url": "https://app.hubspot.com/x/77"}"#);
        assert_eq!(result.sink_record_id.as_deref(), Some("77"));
        assert_eq!(
            result.sink_record_url.as_deref(),
            Some("https://app.hubspot.com/x/77")
        );
    }
}
