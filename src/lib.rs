//! meeting-crm-sync: meeting transcript → LLM action items → CRM records, with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
