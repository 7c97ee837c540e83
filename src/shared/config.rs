//! Application configuration. API credentials, endpoints, CRM property names.
//!
//! Loaded once in `main`; services and adapters receive plain values through
//! their constructors and never read the environment themselves.

use serde::Deserialize;

/// Default OpenAI-compatible chat completions endpoint.
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_HUBSPOT_BASE_URL: &str = "https://api.hubapi.com";
pub const DEFAULT_HUBSPOT_OBJECT_TYPE: &str = "deals";
pub const DEFAULT_REPORTS_DIR: &str = "./data/reports";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    // ─────────────────────────────────────────────────────────────────────────
    // AI Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// OpenAI API key. Read from CRM_SYNC_OPENAI_API_KEY or OPENAI_API_KEY.
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// Chat completions URL. Defaults to OpenAI. Read from CRM_SYNC_OPENAI_API_URL.
    #[serde(default)]
    pub openai_api_url: Option<String>,

    /// Model name. Defaults to "gpt-4o-mini". Read from CRM_SYNC_OPENAI_MODEL.
    #[serde(default)]
    pub openai_model: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // CRM (HubSpot) Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// HubSpot private app token. Read from CRM_SYNC_HUBSPOT_API_KEY or HUBSPOT_API_KEY.
    #[serde(default)]
    pub hubspot_api_key: Option<String>,

    /// HubSpot API base URL. Read from CRM_SYNC_HUBSPOT_BASE_URL.
    #[serde(default)]
    pub hubspot_base_url: Option<String>,

    /// CRM object type records are written to ("deals", "tasks", ...).
    #[serde(default)]
    pub hubspot_object_type: Option<String>,

    #[serde(default)]
    pub description_property: Option<String>,

    #[serde(default)]
    pub priority_property: Option<String>,

    #[serde(default)]
    pub deadline_property: Option<String>,

    #[serde(default)]
    pub assignee_property: Option<String>,

    /// Unset by default: category is only written when a property is named.
    #[serde(default)]
    pub category_property: Option<String>,

    /// Unset by default: parsed deadlines (epoch ms) are only written when a property is named.
    #[serde(default)]
    pub close_date_property: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────────
    /// Directory where saved reports are written. Read from CRM_SYNC_REPORTS_DIR.
    #[serde(default)]
    pub reports_dir: Option<String>,
}

/// CRM property names used when writing an action item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNames {
    pub description: String,
    pub priority: String,
    pub deadline: String,
    pub assignee: String,
    pub category: Option<String>,
    pub close_date: Option<String>,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            description: "ai_systems_description".to_string(),
            priority: "ai_systems_priority".to_string(),
            deadline: "ai_systems_deadline".to_string(),
            assignee: "ai_systems_assignee".to_string(),
            category: None,
            close_date: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("CRM_SYNC"));
        if let Ok(path) = std::env::var("CRM_SYNC_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg: Self = c.build()?.try_deserialize()?;
        // Unprefixed keys are what the HubSpot/OpenAI docs tell people to export
        if cfg.openai_api_key.is_none() {
            cfg.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if cfg.hubspot_api_key.is_none() {
            cfg.hubspot_api_key = std::env::var("HUBSPOT_API_KEY").ok();
        }
        Ok(cfg)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // AI Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the OpenAI API key if configured and non-blank.
    pub fn openai_api_key(&self) -> Option<String> {
        non_blank(&self.openai_api_key)
    }

    /// Returns the completions URL. Defaults to the OpenAI chat completions endpoint.
    pub fn openai_api_url_or_default(&self) -> String {
        non_blank(&self.openai_api_url).unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string())
    }

    /// Returns the model name. Defaults to "gpt-4o-mini".
    pub fn openai_model_or_default(&self) -> String {
        non_blank(&self.openai_model).unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string())
    }

    /// Returns true if AI is configured (API key present).
    pub fn is_ai_configured(&self) -> bool {
        self.openai_api_key().is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // CRM Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    pub fn hubspot_api_key(&self) -> Option<String> {
        non_blank(&self.hubspot_api_key)
    }

    pub fn hubspot_base_url_or_default(&self) -> String {
        non_blank(&self.hubspot_base_url)
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_HUBSPOT_BASE_URL.to_string())
    }

    pub fn hubspot_object_type_or_default(&self) -> String {
        non_blank(&self.hubspot_object_type)
            .unwrap_or_else(|| DEFAULT_HUBSPOT_OBJECT_TYPE.to_string())
    }

    /// Returns true if the HubSpot CRM is configured (token present).
    pub fn is_crm_configured(&self) -> bool {
        self.hubspot_api_key().is_some()
    }

    /// Property names with unset entries filled from defaults.
    pub fn property_names(&self) -> PropertyNames {
        let defaults = PropertyNames::default();
        PropertyNames {
            description: non_blank(&self.description_property).unwrap_or(defaults.description),
            priority: non_blank(&self.priority_property).unwrap_or(defaults.priority),
            deadline: non_blank(&self.deadline_property).unwrap_or(defaults.deadline),
            assignee: non_blank(&self.assignee_property).unwrap_or(defaults.assignee),
            category: non_blank(&self.category_property),
            close_date: non_blank(&self.close_date_property),
        }
    }

    pub fn reports_dir_or_default(&self) -> String {
        non_blank(&self.reports_dir).unwrap_or_else(|| DEFAULT_REPORTS_DIR.to_string())
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert!(!cfg.is_ai_configured());
        assert!(!cfg.is_crm_configured());
        assert_eq!(cfg.openai_api_url_or_default(), DEFAULT_OPENAI_API_URL);
        assert_eq!(cfg.openai_model_or_default(), "gpt-4o-mini");
        assert_eq!(cfg.hubspot_base_url_or_default(), "https://api.hubapi.com");
        assert_eq!(cfg.hubspot_object_type_or_default(), "deals");
        assert_eq!(cfg.property_names(), PropertyNames::default());
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let cfg = AppConfig {
            openai_api_key: Some("   ".to_string()),
            hubspot_api_key: Some("pat-123".to_string()),
            hubspot_base_url: Some("http://localhost:9000/".to_string()),
            priority_property: Some("".to_string()),
            category_property: Some("ai_systems_category".to_string()),
            ..AppConfig::default()
        };
        assert!(!cfg.is_ai_configured());
        assert!(cfg.is_crm_configured());
        assert_eq!(cfg.hubspot_base_url_or_default(), "http://localhost:9000");
        let names = cfg.property_names();
        assert_eq!(names.priority, "ai_systems_priority");
        assert_eq!(names.category.as_deref(), Some("ai_systems_category"));
        assert_eq!(names.close_date, None);
    }
}
