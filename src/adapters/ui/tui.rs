//! Implements InputPort. Inquire-based main menu over the pipeline operations.

use crate::adapters::persistence::ReportStore;
use crate::adapters::ui::progress::with_spinner;
use crate::domain::DomainError;
use crate::ports::InputPort;
use crate::usecases::crm_admin_service::DEFAULT_PROPERTY_GROUP;
use crate::usecases::{
    BulkDeletionService, CompletionService, CrmAdminService, ExtractionService, PipelineService,
    SampleTranscriptService, TaskSinkService,
};
use async_trait::async_trait;
use inquire::ui::{Color, RenderConfig, StyleSheet, Styled};
use inquire::{Confirm, InquireError, Select, Text};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Global inquire theme: magenta prompt prefix, cyan highlights.
pub fn apply_theme() {
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("›").with_fg(Color::LightMagenta))
        .with_highlighted_option_prefix(Styled::new("➤").with_fg(Color::LightCyan))
        .with_answer(StyleSheet::new().with_fg(Color::LightCyan));
    inquire::set_global_render_config(config);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    ExtractItems,
    CreateTasks,
    DeleteAll,
    RawCompletion,
    SampleTranscript,
    CreateSingleTask,
    ListOwners,
    CreatePriorityProperty,
    Exit,
}

impl MenuAction {
    const ALL: [MenuAction; 9] = [
        MenuAction::CreateTasks,
        MenuAction::ExtractItems,
        MenuAction::SampleTranscript,
        MenuAction::CreateSingleTask,
        MenuAction::RawCompletion,
        MenuAction::ListOwners,
        MenuAction::CreatePriorityProperty,
        MenuAction::DeleteAll,
        MenuAction::Exit,
    ];
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuAction::ExtractItems => "Extract action items from a transcript",
            MenuAction::CreateTasks => "Create CRM tasks from a transcript",
            MenuAction::DeleteAll => "Delete ALL records of the CRM object type",
            MenuAction::RawCompletion => "Send a raw prompt to the model",
            MenuAction::SampleTranscript => "Generate a sample transcript",
            MenuAction::CreateSingleTask => "Create a single CRM task",
            MenuAction::ListOwners => "List CRM owners",
            MenuAction::CreatePriorityProperty => "Create the priority select property",
            MenuAction::Exit => "Exit",
        };
        f.write_str(label)
    }
}

/// Services the menu drives.
pub struct TuiServices {
    pub completion: Arc<CompletionService>,
    pub extraction: Arc<ExtractionService>,
    pub sink: Arc<TaskSinkService>,
    pub pipeline: Arc<PipelineService>,
    pub deletion: Arc<BulkDeletionService>,
    pub samples: Arc<SampleTranscriptService>,
    pub admin: Arc<CrmAdminService>,
    pub reports: Arc<ReportStore>,
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    services: TuiServices,
}

impl TuiInputPort {
    pub fn new(services: TuiServices) -> Self {
        Self { services }
    }

    /// Transcript from a file path; empty input generates a sample instead.
    async fn read_transcript(&self) -> Result<String, DomainError> {
        let path = Text::new("Transcript file (leave empty to generate a sample):")
            .prompt()
            .map_err(prompt_error)?;
        let path = path.trim();
        if path.is_empty() {
            let transcript = with_spinner(
                "Generating sample transcript...",
                self.services.samples.generate_sample_transcript(),
            )
            .await;
            println!("\n{}\n", transcript);
            return Ok(transcript);
        }
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DomainError::Ui(format!("read {}: {}", path, e)))
    }

    async fn handle(&self, action: MenuAction) -> Result<(), DomainError> {
        let s = &self.services;
        match action {
            MenuAction::ExtractItems => {
                let transcript = self.read_transcript().await?;
                let items = with_spinner(
                    "Extracting action items...",
                    s.extraction.extract_action_items(&transcript),
                )
                .await;
                print_json(&items)?;
            }
            MenuAction::CreateTasks => {
                let transcript = self.read_transcript().await?;
                let report = with_spinner(
                    "Extracting items and creating CRM tasks...",
                    s.pipeline.create_tasks_from_transcript(&transcript),
                )
                .await;
                print_json(&report)?;
                if confirm_save(s.reports.as_ref())? {
                    let saved = s.reports.save_task_report(&report).await?;
                    println!("Saved {}", saved.markdown_path.display());
                }
            }
            MenuAction::DeleteAll => {
                let proceed = Confirm::new("This deletes every record of the object type. Continue?")
                    .with_default(false)
                    .prompt()
                    .map_err(prompt_error)?;
                if !proceed {
                    println!("Cancelled.");
                    return Ok(());
                }
                let report =
                    with_spinner("Deleting records...", s.deletion.delete_all_records()).await;
                print_json(&report)?;
                if confirm_save(s.reports.as_ref())? {
                    let saved = s.reports.save_deletion_report(&report).await?;
                    println!("Saved {}", saved.markdown_path.display());
                }
            }
            MenuAction::RawCompletion => {
                let prompt = Text::new("Prompt:").prompt().map_err(prompt_error)?;
                let text = with_spinner("Waiting for the model...", s.completion.complete(&prompt))
                    .await;
                println!("\n{}\n", text);
            }
            MenuAction::SampleTranscript => {
                let generated = with_spinner(
                    "Generating sample transcript...",
                    s.samples.generate_with_metadata(),
                )
                .await;
                print_json(&generated)?;
            }
            MenuAction::CreateSingleTask => {
                let description = Text::new("Description:").prompt().map_err(prompt_error)?;
                if description.trim().is_empty() {
                    println!("Description is required.");
                    return Ok(());
                }
                let due = Text::new("Due date (optional):").prompt().map_err(prompt_error)?;
                let priority = Select::new("Priority:", vec!["HIGH", "MEDIUM", "LOW", "NONE"])
                    .with_starting_cursor(1)
                    .prompt()
                    .map_err(prompt_error)?;
                let assignee = Text::new("Assignee owner id (optional):")
                    .prompt()
                    .map_err(prompt_error)?;
                let body = with_spinner(
                    "Creating task...",
                    s.sink
                        .create_task(&description, Some(due.as_str()), Some(priority), Some(assignee.as_str())),
                )
                .await?;
                print_raw_json(&body);
            }
            MenuAction::ListOwners => {
                let body = with_spinner("Fetching owners...", s.admin.list_owners()).await?;
                print_raw_json(&body);
            }
            MenuAction::CreatePriorityProperty => {
                let name = Text::new("Property name:")
                    .with_default("ai_systems_priority")
                    .prompt()
                    .map_err(prompt_error)?;
                let group = Text::new("Property group:")
                    .with_default(DEFAULT_PROPERTY_GROUP)
                    .prompt()
                    .map_err(prompt_error)?;
                let body = with_spinner(
                    "Creating property...",
                    s.admin.create_priority_property(&name, &group),
                )
                .await?;
                print_raw_json(&body);
            }
            MenuAction::Exit => {}
        }
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let action = match Select::new("What do you want to do?", MenuAction::ALL.to_vec())
                .prompt()
            {
                Ok(action) => action,
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    break;
                }
                Err(e) => return Err(prompt_error(e)),
            };
            if action == MenuAction::Exit {
                break;
            }

            info!(action = %action, "menu action selected");
            // A failed action is reported and the menu keeps running
            if let Err(e) = self.handle(action).await {
                warn!(action = %action, error = %e, "menu action failed");
                println!("Error: {}", e);
            }
        }
        Ok(())
    }
}

fn prompt_error(e: InquireError) -> DomainError {
    DomainError::Ui(e.to_string())
}

fn confirm_save(reports: &ReportStore) -> Result<bool, DomainError> {
    Confirm::new(&format!("Save report to {}?", reports.dir().display()))
        .with_default(true)
        .prompt()
        .map_err(prompt_error)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), DomainError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| DomainError::Ui(format!("render output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// Pretty-print a CRM response body when it is JSON; print it as-is otherwise.
fn print_raw_json(body: &str) {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", body),
        },
        Err(_) => println!("{}", body),
    }
}
