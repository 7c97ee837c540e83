//! Run reports on disk: pretty JSON plus a short Markdown digest per run.
//!
//! Files are written to a temp path, synced, then renamed into place.

use crate::domain::{DealDeletionReport, DomainError, ExtractedItem, TaskCreationReport};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Paths of the two files written for one report.
#[derive(Debug, Clone)]
pub struct SavedReport {
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}

pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn save_task_report(
        &self,
        report: &TaskCreationReport,
    ) -> Result<SavedReport, DomainError> {
        self.save("tasks", report, &task_markdown(report)).await
    }

    pub async fn save_deletion_report(
        &self,
        report: &DealDeletionReport,
    ) -> Result<SavedReport, DomainError> {
        self.save("deletion", report, &deletion_markdown(report)).await
    }

    async fn save<T: Serialize>(
        &self,
        kind: &str,
        report: &T,
        markdown: &str,
    ) -> Result<SavedReport, DomainError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DomainError::Report(format!("create reports dir: {}", e)))?;

        let stem = format!("{}_{}", kind, Utc::now().format("%Y%m%dT%H%M%S%3fZ"));
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| DomainError::Report(format!("encode report: {}", e)))?;

        let json_path = self.dir.join(format!("{}.json", stem));
        let markdown_path = self.dir.join(format!("{}.md", stem));
        write_atomic(&json_path, json.as_bytes()).await?;
        write_atomic(&markdown_path, markdown.as_bytes()).await?;

        info!(path = %json_path.display(), "report saved");
        Ok(SavedReport {
            json_path,
            markdown_path,
        })
    }
}

/// Write to `<path>.tmp`, sync, then rename over `path`.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DomainError> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp_path = PathBuf::from(temp);

    let mut f = fs::File::create(&temp_path)
        .await
        .map_err(|e| DomainError::Report(format!("create temp file: {}", e)))?;
    f.write_all(bytes)
        .await
        .map_err(|e| DomainError::Report(format!("write temp file: {}", e)))?;
    f.sync_all()
        .await
        .map_err(|e| DomainError::Report(format!("sync temp file: {}", e)))?;
    drop(f);

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| DomainError::Report(format!("rename report file: {}", e)))
}

fn task_markdown(report: &TaskCreationReport) -> String {
    let mut md = String::new();
    md.push_str("# Task Creation Report\n\n");
    md.push_str(&format!(
        "**Requested:** {} | **Created:** {} | **Failed:** {}\n\n",
        report.total_requested, report.total_succeeded, report.total_failed
    ));
    md.push_str("---\n\n");

    if !report.task_results.is_empty() {
        md.push_str("## Action Items\n\n");
        for result in &report.task_results {
            let done = if result.sink_error.is_none() { "x" } else { " " };
            match &result.item {
                ExtractedItem::Action(item) => {
                    md.push_str(&format!("- [{}] **{}**", done, item.description));
                    let mut meta = vec![format!("Priority: {}", item.priority)];
                    if let Some(assignee) = &item.assignee {
                        meta.push(format!("Owner: {}", assignee));
                    }
                    if let Some(deadline) = &item.deadline {
                        meta.push(format!("Due: {}", deadline));
                    }
                    if let Some(id) = &result.sink_record_id {
                        meta.push(format!("Record: {}", id));
                    }
                    md.push_str(&format!(" ({})", meta.join(", ")));
                }
                other => {
                    let label: String = other.label().replace('\n', " ").chars().take(120).collect();
                    md.push_str(&format!("- [{}] _{}_", done, label));
                }
            }
            md.push('\n');
        }
        md.push('\n');
    }

    if !report.errors.is_empty() {
        md.push_str("## Errors\n\n");
        for error in &report.errors {
            md.push_str(&format!("- {}\n", error));
        }
        md.push('\n');
    }
    md
}

fn deletion_markdown(report: &DealDeletionReport) -> String {
    let mut md = String::new();
    md.push_str("# Bulk Deletion Report\n\n");
    md.push_str(&format!(
        "**Found:** {} | **Deleted:** {} | **Failed:** {}\n\n",
        report.total_found, report.total_deleted, report.total_failed
    ));

    if !report.fetch_errors.is_empty() {
        md.push_str("## Enumeration Errors\n\n");
        for error in &report.fetch_errors {
            md.push_str(&format!("- {}\n", error));
        }
        md.push('\n');
    }

    let failed: Vec<_> = report.statuses.iter().filter(|s| !s.deleted).collect();
    if !failed.is_empty() {
        md.push_str("## Failed Deletions\n\n");
        for status in failed {
            md.push_str(&format!("- `{}`: {}\n", status.record_id, status.message));
        }
        md.push('\n');
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionItem, DealDeletionStatus, Priority, TaskResult};

    fn sample_task_report() -> TaskCreationReport {
        let item = ExtractedItem::Action(ActionItem {
            description: "Send lead sources".to_string(),
            priority: Priority::High,
            deadline: Some("Friday".to_string()),
            assignee: None,
            category: None,
        });
        TaskCreationReport {
            total_requested: 1,
            total_succeeded: 1,
            total_failed: 0,
            responses: vec![r#"{"id":"9"}"#.to_string()],
            errors: vec![],
            action_items: vec![item.clone()],
            task_results: vec![TaskResult {
                item,
                sink_raw_response: Some(r#"{"id":"9"}"#.to_string()),
                sink_record_id: Some("9".to_string()),
                sink_record_url: None,
                sink_error: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_task_report_written_as_json_and_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("reports"));

        let saved = store.save_task_report(&sample_task_report()).await.unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&saved.json_path).unwrap()).unwrap();
        assert_eq!(json["totalRequested"], 1);
        assert_eq!(json["taskResults"][0]["sinkRecordId"], "9");

        let md = std::fs::read_to_string(&saved.markdown_path).unwrap();
        assert!(md.contains("- [x] **Send lead sources** (Priority: HIGH, Due: Friday, Record: 9)"));

        let leftovers: Vec<_> = std::fs::read_dir(store.dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_deletion_report_lists_failures() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let report = DealDeletionReport::from_statuses(
            vec![
                DealDeletionStatus {
                    record_id: "1".to_string(),
                    deleted: true,
                    message: "Status 204".to_string(),
                },
                DealDeletionStatus {
                    record_id: "2".to_string(),
                    deleted: false,
                    message: "Status 404".to_string(),
                },
            ],
            vec!["Failed to paginate records: timeout".to_string()],
        );

        let saved = store.save_deletion_report(&report).await.unwrap();

        let md = std::fs::read_to_string(&saved.markdown_path).unwrap();
        assert!(md.contains("**Found:** 2 | **Deleted:** 1 | **Failed:** 1"));
        assert!(md.contains("- `2`: Status 404"));
        assert!(md.contains("timeout"));
        assert!(saved.json_path.extension().is_some_and(|e| e == "json"));
    }
}
