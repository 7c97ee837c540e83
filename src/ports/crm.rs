//! CRM outbound port. Create, enumerate and delete records in an object store (e.g. HubSpot).

use crate::domain::{DomainError, PropertyDefinition, RecordPage};
use std::collections::BTreeMap;

/// Port for the CRM object store.
///
/// Every method is exactly one network call; nothing here retries. The object
/// type (deals, tasks, ...) is fixed by the adapter at construction.
#[async_trait::async_trait]
pub trait CrmPort: Send + Sync {
    /// Create one record from a property map.
    ///
    /// Returns the raw response body (JSON containing at least `id`).
    ///
    /// # Errors
    /// Returns `DomainError::Crm` on transport failure or a non-2xx status.
    async fn create_record(
        &self,
        properties: &BTreeMap<String, String>,
    ) -> Result<String, DomainError>;

    /// Fetch one page of record identifiers.
    ///
    /// # Arguments
    /// * `after` - Cursor from the previous page (`None` for the first page)
    /// * `limit` - Page size
    async fn list_records(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<RecordPage, DomainError>;

    /// Delete one record. Returns the HTTP status code; non-2xx is not an `Err`.
    async fn delete_record(&self, record_id: &str) -> Result<u16, DomainError>;

    /// List CRM owners (users records can be assigned to). Raw JSON body.
    async fn list_owners(&self) -> Result<String, DomainError>;

    /// Create a custom property on the object type. Raw JSON body.
    async fn create_property(&self, definition: &PropertyDefinition)
    -> Result<String, DomainError>;
}
