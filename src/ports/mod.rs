//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by UI/adapter into the application
//! - Outbound: Called by application into infrastructure

pub mod crm;
pub mod inbound;
pub mod outbound;

pub use crm::CrmPort;
pub use inbound::InputPort;
pub use outbound::AiPort;
