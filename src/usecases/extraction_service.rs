//! Extraction normalizer. Transcript → model output → structured action items.
//!
//! Never fails: unparseable output becomes a single `RawOutput` item and a
//! failed model call becomes a single `Error` item.

use crate::domain::{ActionItem, CompletionOutcome, ExtractedItem};
use crate::usecases::completion_service::{CompletionService, NO_RESPONSE_SENTINEL};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ExtractionService {
    completion: Arc<CompletionService>,
}

impl ExtractionService {
    pub fn new(completion: Arc<CompletionService>) -> Self {
        Self { completion }
    }

    /// Build the extraction prompt for a transcript.
    pub fn extraction_prompt(transcript: &str) -> String {
        format!(
            "Extract all action items from the following meeting transcript. \
             For each action item, provide: description, priority (HIGH/MEDIUM/LOW), \
             deadline (if mentioned), assignee (if mentioned), and category \
             (e.g., training, integration, feedback). \
             Return the result as a JSON array of objects with keys: \
             description, priority, deadline, assignee, category. \
             If there are no action items, return an empty JSON array []. \
             Transcript: {}",
            transcript
        )
    }

    /// Extract action items from a meeting transcript.
    pub async fn extract_action_items(&self, transcript: &str) -> Vec<ExtractedItem> {
        info!(
            transcript_len = transcript.len(),
            "extracting action items"
        );

        let prompt = Self::extraction_prompt(transcript);
        let items = match self.completion.try_complete(&prompt).await {
            CompletionOutcome::Text(text) => normalize_output(&text),
            CompletionOutcome::Empty => vec![ExtractedItem::RawOutput {
                raw_output: NO_RESPONSE_SENTINEL.to_string(),
            }],
            CompletionOutcome::Failed(e) => {
                warn!(error = %e, "action item extraction failed");
                vec![ExtractedItem::Error {
                    error: format!("Failed to extract action items: {}", e),
                }]
            }
        };

        info!(
            items = items.len(),
            sentinels = items.iter().filter(|i| i.is_sentinel()).count(),
            "action item extraction complete"
        );
        items
    }
}

/// Strip one leading and one trailing markdown code fence.
///
/// Only the fence markers go: a leading ```` ``` ```` with an optional language
/// tag on the same line, and a trailing ```` ``` ````. Anything else is kept.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag ("json", "JSON", ...) up to the first newline
    let body = match after_open.find('\n') {
        Some(nl) if after_open[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &after_open[nl + 1..]
        }
        Some(_) => after_open,
        None => after_open
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .trim_start(),
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Strict parse of a JSON array of action-item objects.
///
/// Every element must be a JSON object; arrays of arrays or scalars are rejected
/// even though `ActionItem` would accept a positional sequence.
pub fn parse_action_items(json: &str) -> Result<Vec<ActionItem>, serde_json::Error> {
    let objects: Vec<Map<String, Value>> = serde_json::from_str(json)?;
    objects
        .into_iter()
        .map(|object| serde_json::from_value(Value::Object(object)))
        .collect()
}

/// Model text → items, degrading to a single raw-output item on parse failure.
pub fn normalize_output(raw: &str) -> Vec<ExtractedItem> {
    let clean = strip_code_fence(raw);
    match parse_action_items(clean) {
        Ok(items) => items.into_iter().map(ExtractedItem::Action).collect(),
        Err(e) => {
            warn!(
                error = %e,
                json = %clean.chars().take(200).collect::<String>(),
                "action item JSON parse failed"
            );
            vec![ExtractedItem::RawOutput {
                raw_output: clean.to_string(),
            }]
        }
    }
}
