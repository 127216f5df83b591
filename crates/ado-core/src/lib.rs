//! Query translation and response projection for Azure DevOps Git data
//!
//! This crate turns tool parameters into backend queries and backend
//! responses into compact tool payloads:
//!
//! ```text
//! parameters -> criteria -> backend fetch -> pager -> projector -> payload
//!                   |
//!                   +--> identity (optional)
//! ```
//!
//! - [`criteria`]: per-operation search criteria and enum validation
//! - [`identity`]: "me" / email / handle to backend user id
//! - [`pager`]: deterministic sort and `[skip, skip + top)` slicing
//! - [`projector`]: minimal schemas, or the backend object untouched
//! - [`backend`]: the [`GitBackend`] / [`IdentityService`] seams and the HTTP client
//! - [`auth`] and [`config`]: credentials and connection settings

pub mod auth;
pub mod backend;
pub mod config;
pub mod criteria;
pub mod enums;
pub mod error;
pub mod identity;
pub mod models;
pub mod pager;
pub mod projector;

pub use backend::{Connection, ConnectionProvider, GitBackend, HttpConnectionProvider, IdentityService};
pub use config::{AdoConfig, AuthMode};
pub use error::{Error, Result};
pub use identity::{IdentityResolver, IdentitySelector};
pub use pager::{DEFAULT_TOP, Page};
pub use projector::Projection;
