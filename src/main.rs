//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use dotenv::dotenv;
use meeting_crm_sync::adapters::ai::{MockAiAdapter, OpenAiAdapter};
use meeting_crm_sync::adapters::integrations::{HubSpotAdapter, InMemoryCrm};
use meeting_crm_sync::adapters::persistence::ReportStore;
use meeting_crm_sync::adapters::ui::tui::{TuiInputPort, TuiServices};
use meeting_crm_sync::ports::{AiPort, CrmPort, InputPort};
use meeting_crm_sync::shared::config::AppConfig;
use meeting_crm_sync::usecases::{
    BulkDeletionService, CompletionService, CrmAdminService, ExtractionService, PipelineService,
    SampleTranscriptService, TaskSinkService,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    meeting_crm_sync::adapters::ui::init_ui();

    let cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("config load failed: {}", e))?;

    // --- AI ---
    let ai: Arc<dyn AiPort> = match cfg.openai_api_key() {
        Some(key) => {
            info!(
                model = %cfg.openai_model_or_default(),
                url = %cfg.openai_api_url_or_default(),
                "OpenAI adapter enabled"
            );
            Arc::new(OpenAiAdapter::new(
                cfg.openai_api_url_or_default(),
                key,
                cfg.openai_model_or_default(),
            ))
        }
        None => {
            warn!("OPENAI_API_KEY not set, using mock AI adapter");
            Arc::new(MockAiAdapter::new())
        }
    };

    // --- CRM ---
    let crm: Arc<dyn CrmPort> = match cfg.hubspot_api_key() {
        Some(token) => {
            info!(
                base_url = %cfg.hubspot_base_url_or_default(),
                object_type = %cfg.hubspot_object_type_or_default(),
                "HubSpot adapter enabled"
            );
            Arc::new(HubSpotAdapter::new(
                cfg.hubspot_base_url_or_default(),
                token,
                cfg.hubspot_object_type_or_default(),
            ))
        }
        None => {
            warn!("HUBSPOT_API_KEY not set, using in-memory CRM (nothing leaves this process)");
            Arc::new(InMemoryCrm::new())
        }
    };

    // --- Services ---
    let completion = Arc::new(CompletionService::new(ai));
    let extraction = Arc::new(ExtractionService::new(Arc::clone(&completion)));
    let sink = Arc::new(TaskSinkService::new(
        Arc::clone(&crm),
        cfg.property_names(),
    ));
    let pipeline = Arc::new(PipelineService::new(
        Arc::clone(&extraction),
        Arc::clone(&sink),
    ));
    let deletion = Arc::new(BulkDeletionService::new(Arc::clone(&crm)));
    let samples = Arc::new(SampleTranscriptService::new(Arc::clone(&completion)));
    let admin = Arc::new(CrmAdminService::new(Arc::clone(&crm)));

    let reports_dir = cfg.reports_dir_or_default();
    info!(path = %reports_dir, "reports directory");
    let reports = Arc::new(ReportStore::new(&reports_dir));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(TuiServices {
        completion,
        extraction,
        sink,
        pipeline,
        deletion,
        samples,
        admin,
        reports,
    }));

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
