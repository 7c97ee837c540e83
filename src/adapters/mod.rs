//! Infrastructure adapters. Implement outbound ports.
//!
//! OpenAI, HubSpot, report files, terminal UI. Map errors to DomainError.

pub mod ai;
pub mod integrations;
pub mod persistence;
pub mod ui;
