//! Credential acquisition
//!
//! A [`TokenProvider`] is asked for a credential every time a connection is
//! opened, so token refresh stays with the provider.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::{AdoConfig, AuthMode};
use crate::{Error, Result};

/// Azure DevOps resource id used when requesting Entra ID tokens
pub const AZURE_DEVOPS_RESOURCE: &str = "499b84ac-1321-427f-aa17-267ca6975798";

/// Environment variable holding a personal access token
pub const PAT_ENV_VAR: &str = "ADO_MCP_PAT";

/// Credential attached to backend requests
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Personal access token, sent as basic auth with an empty user
    Pat(String),
    /// OAuth / Entra ID bearer token
    Bearer(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Pat(_) => f.write_str("Credential::Pat(***)"),
            Credential::Bearer(_) => f.write_str("Credential::Bearer(***)"),
        }
    }
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn credential(&self) -> Result<Credential>;
}

/// Always returns the same credential
pub struct StaticTokenProvider {
    credential: Credential,
}

impl StaticTokenProvider {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn credential(&self) -> Result<Credential> {
        Ok(self.credential.clone())
    }
}

/// Fetches a bearer token from the Azure CLI on every call
pub struct AzureCliTokenProvider {
    program: String,
}

impl Default for AzureCliTokenProvider {
    fn default() -> Self {
        Self {
            program: "az".to_string(),
        }
    }
}

impl AzureCliTokenProvider {
    /// Use a different executable than `az`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for AzureCliTokenProvider {
    async fn credential(&self) -> Result<Credential> {
        tracing::debug!(program = %self.program, "Requesting access token");
        let output = Command::new(&self.program)
            .args([
                "account",
                "get-access-token",
                "--resource",
                AZURE_DEVOPS_RESOURCE,
                "--query",
                "accessToken",
                "--output",
                "tsv",
            ])
            .output()
            .await
            .map_err(|e| Error::backend(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::backend(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(Error::backend(format!("{} returned an empty token", self.program)));
        }
        Ok(Credential::Bearer(token))
    }
}

/// Provider for the configured [`AuthMode`]
pub fn token_provider(config: &AdoConfig) -> Result<Arc<dyn TokenProvider>> {
    match config.auth {
        AuthMode::Pat => {
            let pat = config
                .pat
                .clone()
                .or_else(|| std::env::var(PAT_ENV_VAR).ok())
                .filter(|p| !p.is_empty())
                .ok_or_else(|| Error::Config {
                    message: format!("auth mode 'pat' requires a token (set {PAT_ENV_VAR})"),
                })?;
            Ok(Arc::new(StaticTokenProvider::new(Credential::Pat(pat))))
        }
        AuthMode::AzureCli => Ok(Arc::new(AzureCliTokenProvider::default())),
    }
}
