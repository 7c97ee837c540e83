//! CRM admin operations: owner lookup and custom property setup.

use crate::domain::{DomainError, PropertyDefinition};
use crate::ports::CrmPort;
use std::sync::Arc;
use tracing::info;

/// Property group HubSpot shows custom deal properties under.
pub const DEFAULT_PROPERTY_GROUP: &str = "dealinformation";

pub struct CrmAdminService {
    crm: Arc<dyn CrmPort>,
}

impl CrmAdminService {
    pub fn new(crm: Arc<dyn CrmPort>) -> Self {
        Self { crm }
    }

    /// Raw owners listing, for finding ids to use as assignees.
    pub async fn list_owners(&self) -> Result<String, DomainError> {
        self.crm.list_owners().await
    }

    /// Create a High/Medium/Low select property named `name`.
    pub async fn create_priority_property(
        &self,
        name: &str,
        group_name: &str,
    ) -> Result<String, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Config("property name must not be empty".into()));
        }
        let definition = PropertyDefinition::priority_select(name.trim(), group_name);
        let body = self.crm.create_property(&definition).await?;
        info!(property = %definition.name, "priority property created");
        Ok(body)
    }
}
