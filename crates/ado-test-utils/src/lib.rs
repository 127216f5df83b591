//! Shared test utilities for the ado-mcp workspace.
//!
//! Dev-dependency only; never published.
//!
//! # Modules
//!
//! - [`fake`]: [`FakeBackend`], an in-memory backend that records every call
//! - [`fixtures`]: builders for backend entities

pub mod fake;
pub mod fixtures;

pub use fake::{Call, FakeBackend};
