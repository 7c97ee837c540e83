//! CRM integrations. Implement CrmPort.

pub mod hubspot;
pub mod memory_crm;

pub use hubspot::HubSpotAdapter;
pub use memory_crm::InMemoryCrm;
