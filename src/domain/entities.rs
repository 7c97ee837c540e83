//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/IO types here; these are mapped from adapters. Everything is scoped
//! to a single request; nothing is persisted between runs except saved reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Priority of an action item.
///
/// `None` is a real member (sent to the CRM as `"NONE"`), not an absent value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl Priority {
    /// Case-insensitive parse. Blank or unrecognized values map to `Priority::None`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Priority::High,
            "MEDIUM" => Priority::Medium,
            "LOW" => Priority::Low,
            _ => Priority::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
            Priority::None => "NONE",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Priority::parse(&s),
            _ => Priority::None,
        })
    }
}

/// A single task extracted from a transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
}

impl ActionItem {
    pub fn new(description: impl Into<String>, priority: Priority) -> Self {
        Self {
            description: description.into(),
            priority,
            ..Self::default()
        }
    }
}

/// Models mix strings, numbers and nulls for free-text fields.
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value).unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value).filter(|s| !s.trim().is_empty()))
}

/// Outcome of extraction for one entry.
///
/// Sentinel variants carry model output that could not be structured, or the
/// reason extraction failed, so callers always get an inspectable list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedItem {
    RawOutput { raw_output: String },
    Error { error: String },
    Action(ActionItem),
}

impl ExtractedItem {
    pub fn action(&self) -> Option<&ActionItem> {
        match self {
            ExtractedItem::Action(item) => Some(item),
            _ => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, ExtractedItem::Action(_))
    }

    /// Short human-readable description (used in logs and reports).
    pub fn label(&self) -> &str {
        match self {
            ExtractedItem::Action(item) => &item.description,
            ExtractedItem::RawOutput { raw_output } => raw_output,
            ExtractedItem::Error { error } => error,
        }
    }
}

/// One request/response exchange with the completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Result of the completion client after its retry policy ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Non-empty, trimmed text.
    Text(String),
    /// Every attempt answered without usable text.
    Empty,
    /// No usable text and at least one attempt failed in transport; carries the last error.
    Failed(String),
}

/// Per-item result of the transcript → CRM pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    #[serde(flatten)]
    pub item: ExtractedItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink_raw_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink_record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink_record_url: Option<String>,
    /// Why the sink rejected this item. Distinct from a flattened sentinel's own `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink_error: Option<String>,
}

/// Aggregated report of one transcript → CRM run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreationReport {
    pub total_requested: usize,
    pub total_succeeded: usize,
    pub total_failed: usize,
    pub responses: Vec<String>,
    pub errors: Vec<String>,
    pub action_items: Vec<ExtractedItem>,
    pub task_results: Vec<TaskResult>,
}

/// Outcome of deleting one CRM record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealDeletionStatus {
    pub record_id: String,
    pub deleted: bool,
    pub message: String,
}

/// Aggregated report of a collect-then-delete-all run.
///
/// `fetch_errors` means enumeration stopped early; failed statuses mean
/// enumeration finished but some deletes did not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealDeletionReport {
    pub total_found: usize,
    pub total_deleted: usize,
    pub total_failed: usize,
    pub statuses: Vec<DealDeletionStatus>,
    pub fetch_errors: Vec<String>,
}

impl DealDeletionReport {
    pub fn from_statuses(statuses: Vec<DealDeletionStatus>, fetch_errors: Vec<String>) -> Self {
        let total_deleted = statuses.iter().filter(|s| s.deleted).count();
        Self {
            total_found: statuses.len(),
            total_deleted,
            total_failed: statuses.len() - total_deleted,
            statuses,
            fetch_errors,
        }
    }
}

/// One page of CRM record enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPage {
    pub ids: Vec<String>,
    /// Cursor for the next page; `None` on the last page.
    pub next_after: Option<String>,
}

/// Definition of a CRM enumeration property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub name: String,
    pub label: String,
    pub description: String,
    pub group_name: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub field_type: String,
    pub options: Vec<PropertyOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyOption {
    pub label: String,
    pub value: String,
}

impl PropertyDefinition {
    /// Select property with High/Medium/Low options.
    pub fn priority_select(name: &str, group_name: &str) -> Self {
        let options = [Priority::High, Priority::Medium, Priority::Low]
            .iter()
            .map(|p| {
                let value = p.as_str().to_string();
                let mut label = value.to_ascii_lowercase();
                label[..1].make_ascii_uppercase();
                PropertyOption { label, value }
            })
            .collect();
        Self {
            name: name.to_string(),
            label: name.to_string(),
            description: name.to_string(),
            group_name: group_name.to_string(),
            property_type: "enumeration".to_string(),
            field_type: "select".to_string(),
            options,
        }
    }
}

/// Sample transcript plus execution metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTranscript {
    pub transcript: String,
    /// True when the model gave nothing and the built-in base transcript was returned.
    pub fallback_used: bool,
    pub executed_at: DateTime<Utc>,
    pub duration_ms: u64,
}
