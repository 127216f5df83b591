//! Identity resolution
//!
//! Turns "the caller" or an email / account handle into the backend's stable
//! user id. Nothing is cached; each tool invocation resolves again.

use crate::backend::IdentityService;
use crate::{Error, Result};

/// Which identity a filter refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySelector {
    /// The authenticated caller
    Caller,
    /// An email address or account handle
    Explicit(String),
}

impl IdentitySelector {
    /// Selector for an explicit identifier, rejecting empty input
    pub fn explicit(identifier: impl Into<String>) -> Result<Self> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(Error::invalid_parameters("user identifier must not be empty"));
        }
        Ok(Self::Explicit(identifier))
    }
}

/// Resolves [`IdentitySelector`]s against an [`IdentityService`]
pub struct IdentityResolver<'a> {
    service: &'a dyn IdentityService,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(service: &'a dyn IdentityService) -> Self {
        Self { service }
    }

    /// Resolve a selector to a backend user id
    pub async fn resolve(&self, selector: &IdentitySelector) -> Result<String> {
        match selector {
            IdentitySelector::Caller => self.service.current_user_id().await,
            IdentitySelector::Explicit(identifier) => {
                tracing::debug!(identifier = %identifier, "Resolving identity");
                self.service
                    .find_user_id(identifier)
                    .await?
                    .ok_or_else(|| Error::IdentityNotFound {
                        identifier: identifier.clone(),
                    })
            }
        }
    }

    /// Resolve an optional selector, passing `None` through
    pub async fn resolve_opt(&self, selector: Option<&IdentitySelector>) -> Result<Option<String>> {
        match selector {
            Some(selector) => self.resolve(selector).await.map(Some),
            None => Ok(None),
        }
    }
}
