//! Bulk deletion: enumerate every record of the configured object type, then delete each one.
//!
//! - FETCH: follows `paging.next.after` cursors until a page has none or a cursor repeats
//! - A fetch failure stops enumeration but keeps the ids already collected
//! - DELETE: one call per id; failures are recorded per id and never stop the run

use crate::domain::{DealDeletionReport, DealDeletionStatus};
use crate::ports::CrmPort;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Page size for record enumeration.
pub const PAGE_SIZE: usize = 100;

pub struct BulkDeletionService {
    crm: Arc<dyn CrmPort>,
}

/// Ids collected by the FETCH phase plus the error that ended it early, if any.
#[derive(Debug, Default)]
pub struct CollectedIds {
    pub ids: Vec<String>,
    pub fetch_errors: Vec<String>,
    pub pages: usize,
}

impl BulkDeletionService {
    pub fn new(crm: Arc<dyn CrmPort>) -> Self {
        Self { crm }
    }

    /// Delete every record. Never fails; see the report for fetch and delete errors.
    pub async fn delete_all_records(&self) -> DealDeletionReport {
        let collected = self.collect_record_ids().await;
        info!(
            found = collected.ids.len(),
            pages = collected.pages,
            fetch_errors = collected.fetch_errors.len(),
            "record enumeration finished"
        );

        let mut statuses = Vec::with_capacity(collected.ids.len());
        for id in collected.ids {
            statuses.push(self.delete_one(id).await);
        }

        let report = DealDeletionReport::from_statuses(statuses, collected.fetch_errors);
        info!(
            total_found = report.total_found,
            total_deleted = report.total_deleted,
            total_failed = report.total_failed,
            "bulk deletion complete"
        );
        report
    }

    /// FETCH phase. Pages through the object type until the cursor runs out.
    pub async fn collect_record_ids(&self) -> CollectedIds {
        let mut collected = CollectedIds::default();
        let mut after: Option<String> = None;
        let mut seen_cursors: HashSet<String> = HashSet::new();

        loop {
            let page = match self.crm.list_records(after.as_deref(), PAGE_SIZE).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(page = collected.pages + 1, error = %e, "record enumeration failed");
                    collected
                        .fetch_errors
                        .push(format!("Failed to paginate records: {}", e));
                    break;
                }
            };
            collected.pages += 1;
            collected.ids.extend(page.ids);

            match page.next_after {
                // A cursor seen before means the pages cycle
                Some(next) if !seen_cursors.insert(next.clone()) => {
                    warn!(cursor = %next, "pagination cursor did not advance");
                    collected.fetch_errors.push(format!(
                        "Pagination cursor did not advance (after={} already visited)",
                        next
                    ));
                    break;
                }
                Some(next) => after = Some(next),
                None => break,
            }
        }

        collected
    }

    async fn delete_one(&self, record_id: String) -> DealDeletionStatus {
        match self.crm.delete_record(&record_id).await {
            Ok(status) => {
                let deleted = (200..300).contains(&status);
                if !deleted {
                    warn!(record_id = %record_id, status, "record delete rejected");
                }
                DealDeletionStatus {
                    record_id,
                    deleted,
                    message: format!("Status {}", status),
                }
            }
            Err(e) => {
                warn!(record_id = %record_id, error = %e, "record delete failed");
                DealDeletionStatus {
                    record_id,
                    deleted: false,
                    message: e.to_string(),
                }
            }
        }
    }
}
