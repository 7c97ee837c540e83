//! Task sink. Writes action items to the CRM, one record per item.
//!
//! No retries here. Single-task calls propagate CRM failures; the batch call
//! isolates them per item so one bad item never hides the others.

use crate::domain::{ActionItem, DomainError, ExtractedItem, Priority};
use crate::ports::CrmPort;
use crate::shared::config::PropertyNames;
use chrono::{DateTime, NaiveDate};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct TaskSinkService {
    crm: Arc<dyn CrmPort>,
    properties: PropertyNames,
}

impl TaskSinkService {
    pub fn new(crm: Arc<dyn CrmPort>, properties: PropertyNames) -> Self {
        Self { crm, properties }
    }

    /// Create one CRM record. Returns the raw response body.
    ///
    /// # Arguments
    /// * `description` - Task body
    /// * `due_date` - Free-form deadline; omitted when absent or blank
    /// * `priority` - Uppercased; `"NONE"` when absent or blank
    /// * `assignee` - Owner reference; omitted when absent or blank
    ///
    /// # Errors
    /// Returns `DomainError::Crm` if the CRM call fails.
    pub async fn create_task(
        &self,
        description: &str,
        due_date: Option<&str>,
        priority: Option<&str>,
        assignee: Option<&str>,
    ) -> Result<String, DomainError> {
        let properties = self.build_properties(description, due_date, priority, assignee, None);
        self.crm.create_record(&properties).await
    }

    /// Create one CRM record from an extracted action item.
    pub async fn create_task_for_item(&self, item: &ActionItem) -> Result<String, DomainError> {
        let properties = self.build_properties(
            &item.description,
            item.deadline.as_deref(),
            Some(item.priority.as_str()),
            item.assignee.as_deref(),
            item.category.as_deref(),
        );
        self.crm.create_record(&properties).await
    }

    /// Create one record per item, in input order.
    ///
    /// Returns one result per item; a failure on one item does not stop the
    /// rest. Sentinel items are never sent to the CRM.
    pub async fn create_tasks_from_action_items(
        &self,
        items: &[ExtractedItem],
    ) -> Vec<Result<String, DomainError>> {
        let mut results = Vec::with_capacity(items.len());
        for (index, extracted) in items.iter().enumerate() {
            let result = match extracted {
                ExtractedItem::Action(item) => self.create_task_for_item(item).await,
                ExtractedItem::RawOutput { raw_output } => Err(DomainError::UnstructuredItem(
                    format!(
                        "model output could not be parsed: {}",
                        raw_output.chars().take(200).collect::<String>()
                    ),
                )),
                ExtractedItem::Error { error } => {
                    Err(DomainError::UnstructuredItem(error.clone()))
                }
            };
            if let Err(e) = &result {
                warn!(index, error = %e, "task creation failed");
            }
            results.push(result);
        }

        info!(
            requested = items.len(),
            created = results.iter().filter(|r| r.is_ok()).count(),
            "task batch finished"
        );
        results
    }

    fn build_properties(
        &self,
        description: &str,
        due_date: Option<&str>,
        priority: Option<&str>,
        assignee: Option<&str>,
        category: Option<&str>,
    ) -> BTreeMap<String, String> {
        let names = &self.properties;
        let mut props = BTreeMap::new();

        props.insert(names.description.clone(), description.to_string());

        let priority = priority
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_uppercase)
            .unwrap_or_else(|| Priority::None.as_str().to_string());
        props.insert(names.priority.clone(), priority);

        if let Some(due) = non_blank(due_date) {
            props.insert(names.deadline.clone(), due.to_string());
            if let (Some(prop), Some(ms)) = (&names.close_date, parse_close_date(due)) {
                props.insert(prop.clone(), ms.to_string());
            }
        }
        if let Some(owner) = non_blank(assignee) {
            props.insert(names.assignee.clone(), owner.to_string());
        }
        if let (Some(prop), Some(cat)) = (&names.category, non_blank(category)) {
            props.insert(prop.clone(), cat.to_string());
        }

        props
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Convert a deadline to epoch milliseconds.
///
/// Accepts epoch millis, an RFC 3339 instant, or `YYYY-MM-DD` (UTC midnight).
/// Anything else ("Friday", "end of week") returns `None`.
pub fn parse_close_date(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ms) = raw.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::integrations::InMemoryCrm;

    fn sink(crm: Arc<InMemoryCrm>) -> TaskSinkService {
        TaskSinkService::new(crm, PropertyNames::default())
    }

    #[tokio::test]
    async fn test_create_task_maps_properties() {
        let crm = Arc::new(InMemoryCrm::new());
        let body = sink(crm.clone())
            .create_task(
                "Follow up with client",
                Some("2025-12-10"),
                Some("high"),
                Some(""),
            )
            .await
            .unwrap();
        assert!(body.contains(r#""id":"1""#));

        let records = crm.records();
        let props = &records[0].1;
        assert_eq!(props["ai_systems_description"], "Follow up with client");
        assert_eq!(props["ai_systems_priority"], "HIGH");
        assert_eq!(props["ai_systems_deadline"], "2025-12-10");
        assert!(!props.contains_key("ai_systems_assignee"));
    }

    #[tokio::test]
    async fn test_missing_priority_defaults_to_none_member() {
        let crm = Arc::new(InMemoryCrm::new());
        sink(crm.clone())
            .create_task("x", None, Some("  "), None)
            .await
            .unwrap();
        let props = &crm.records()[0].1;
        assert_eq!(props["ai_systems_priority"], "NONE");
        assert!(!props.contains_key("ai_systems_deadline"));
    }

    #[tokio::test]
    async fn test_optional_category_and_close_date_properties() {
        let crm = Arc::new(InMemoryCrm::new());
        let names = PropertyNames {
            category: Some("ai_systems_category".to_string()),
            close_date: Some("closedate".to_string()),
            ..PropertyNames::default()
        };
        let item = ActionItem {
            description: "Book training".to_string(),
            priority: Priority::Low,
            deadline: Some("2024-11-22".to_string()),
            assignee: Some("Sarah".to_string()),
            category: Some("training".to_string()),
        };
        TaskSinkService::new(crm.clone(), names)
            .create_task_for_item(&item)
            .await
            .unwrap();

        let props = &crm.records()[0].1;
        assert_eq!(props["ai_systems_category"], "training");
        assert_eq!(props["closedate"], "1732233600000");
        assert_eq!(props["ai_systems_assignee"], "Sarah");
        assert_eq!(props["ai_systems_priority"], "LOW");
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_failures() {
        let crm = Arc::new(InMemoryCrm::new().failing_create(1));
        let items = vec![
            ExtractedItem::Action(ActionItem::new("first", Priority::High)),
            ExtractedItem::Action(ActionItem::new("second", Priority::Low)),
            ExtractedItem::Action(ActionItem::new("third", Priority::None)),
        ];

        let results = sink(crm.clone()).create_tasks_from_action_items(&items).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        let descriptions: Vec<String> = crm
            .records()
            .into_iter()
            .map(|(_, p)| p["ai_systems_description"].clone())
            .collect();
        assert_eq!(descriptions, vec!["first", "third"]);
    }

    #[tokio::test]
    async fn test_sentinel_items_are_not_sent() {
        let crm = Arc::new(InMemoryCrm::new());
        let items = vec![ExtractedItem::RawOutput {
            raw_output: "garbage".to_string(),
        }];

        let results = sink(crm.clone()).create_tasks_from_action_items(&items).await;

        assert!(matches!(results[0], Err(DomainError::UnstructuredItem(_))));
        assert!(crm.records().is_empty());
    }

    #[test]
    fn test_parse_close_date_formats() {
        assert_eq!(parse_close_date("1733788800000"), Some(1_733_788_800_000));
        assert_eq!(
            parse_close_date("2024-12-10T00:00:00Z"),
            Some(1_733_788_800_000)
        );
        assert_eq!(parse_close_date("2024-12-10"), Some(1_733_788_800_000));
        assert_eq!(parse_close_date("Friday"), None);
        assert_eq!(parse_close_date(" "), None);
    }
}
