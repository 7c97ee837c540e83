//! In-memory CRM. Implements CrmPort without network access.
//!
//! Used when no HubSpot token is configured (dry runs) and by tests. Failures
//! can be injected per create call, per list page and per record id.

use crate::domain::{DomainError, PropertyDefinition, RecordPage};
use crate::ports::CrmPort;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use tracing::info;

#[derive(Default)]
struct Store {
    next_id: u64,
    /// Records in creation order.
    records: Vec<(String, BTreeMap<String, String>)>,
    create_calls: usize,
    list_calls: usize,
    delete_calls: Vec<String>,
    properties: Vec<PropertyDefinition>,
}

/// In-memory object store with HubSpot-like ids and offset cursors.
pub struct InMemoryCrm {
    store: Mutex<Store>,
    failing_creates: HashSet<usize>,
    failing_pages: HashSet<usize>,
    failing_deletes: HashSet<String>,
    delete_statuses: HashMap<String, u16>,
}

impl InMemoryCrm {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store {
                next_id: 1,
                ..Store::default()
            }),
            failing_creates: HashSet::new(),
            failing_pages: HashSet::new(),
            failing_deletes: HashSet::new(),
            delete_statuses: HashMap::new(),
        }
    }

    /// Pre-populate `count` records with ids "1".."count".
    pub fn with_records(self, count: usize) -> Self {
        if let Ok(mut store) = self.store.lock() {
            for _ in 0..count {
                let id = store.next_id.to_string();
                store.next_id += 1;
                store.records.push((id, BTreeMap::new()));
            }
        }
        self
    }

    /// Fail the n-th (0-based) `create_record` call.
    pub fn failing_create(mut self, call_index: usize) -> Self {
        self.failing_creates.insert(call_index);
        self
    }

    /// Fail the n-th (0-based) `list_records` call.
    pub fn failing_page(mut self, call_index: usize) -> Self {
        self.failing_pages.insert(call_index);
        self
    }

    /// Fail deletion of the given record id with a transport-style error.
    pub fn failing_delete(mut self, record_id: &str) -> Self {
        self.failing_deletes.insert(record_id.to_string());
        self
    }

    /// Answer deletion of the given record id with a fixed status (e.g. 404).
    pub fn delete_status(mut self, record_id: &str, status: u16) -> Self {
        self.delete_statuses.insert(record_id.to_string(), status);
        self
    }

    /// Property maps of records currently stored, in creation order.
    pub fn records(&self) -> Vec<(String, BTreeMap<String, String>)> {
        self.store
            .lock()
            .map(|s| s.records.clone())
            .unwrap_or_default()
    }

    /// Ids passed to `delete_record`, in call order.
    pub fn delete_calls(&self) -> Vec<String> {
        self.store
            .lock()
            .map(|s| s.delete_calls.clone())
            .unwrap_or_default()
    }

    pub fn list_calls(&self) -> usize {
        self.store.lock().map(|s| s.list_calls).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Store>, DomainError> {
        self.store
            .lock()
            .map_err(|e| DomainError::Crm(format!("in-memory store poisoned: {}", e)))
    }
}

impl Default for InMemoryCrm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CrmPort for InMemoryCrm {
    async fn create_record(
        &self,
        properties: &BTreeMap<String, String>,
    ) -> Result<String, DomainError> {
        let mut store = self.lock()?;
        let call = store.create_calls;
        store.create_calls += 1;
        if self.failing_creates.contains(&call) {
            return Err(DomainError::Crm(format!(
                "HubSpot API error 400 Bad Request (create record): simulated failure on call {}",
                call
            )));
        }

        let id = store.next_id.to_string();
        store.next_id += 1;
        store.records.push((id.clone(), properties.clone()));
        info!(record_id = %id, "[MEMORY] record created");

        Ok(serde_json::json!({ "id": id, "properties": properties }).to_string())
    }

    async fn list_records(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<RecordPage, DomainError> {
        let mut store = self.lock()?;
        let call = store.list_calls;
        store.list_calls += 1;
        if self.failing_pages.contains(&call) {
            return Err(DomainError::Crm(format!(
                "Request failed: simulated failure on page {}",
                call + 1
            )));
        }

        let offset = match after {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| DomainError::Crm(format!("invalid cursor: {}", cursor)))?,
            None => 0,
        };
        let end = (offset + limit).min(store.records.len());
        let ids = store
            .records
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .map(|(id, _)| id.clone())
            .collect();
        let next_after = (end < store.records.len()).then(|| end.to_string());

        Ok(RecordPage { ids, next_after })
    }

    async fn delete_record(&self, record_id: &str) -> Result<u16, DomainError> {
        let mut store = self.lock()?;
        store.delete_calls.push(record_id.to_string());
        if self.failing_deletes.contains(record_id) {
            return Err(DomainError::Crm(format!(
                "Request failed: connection reset while deleting {}",
                record_id
            )));
        }
        if let Some(status) = self.delete_statuses.get(record_id) {
            return Ok(*status);
        }

        let before = store.records.len();
        store.records.retain(|(id, _)| id != record_id);
        Ok(if store.records.len() < before { 204 } else { 404 })
    }

    async fn list_owners(&self) -> Result<String, DomainError> {
        Ok(serde_json::json!({
            "results": [
                {"id": "1", "email": "owner@example.com", "firstName": "Offline", "lastName": "Owner"}
            ]
        })
        .to_string())
    }

    async fn create_property(
        &self,
        definition: &PropertyDefinition,
    ) -> Result<String, DomainError> {
        self.lock()?.properties.push(definition.clone());
        serde_json::to_string(definition)
            .map_err(|e| DomainError::Crm(format!("Failed to encode property: {}", e)))
    }
}
