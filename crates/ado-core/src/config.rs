//! Server configuration
//!
//! Parsed from an optional TOML file and overridden by command-line values.
//!
//! ```toml
//! organization = "contoso"
//! default_project = "Platform"
//! auth = "pat"
//! pat = "..."
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

fn default_api_version() -> String {
    "7.1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// How credentials are obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    /// Personal access token from config or `ADO_MCP_PAT`
    Pat,
    /// `az account get-access-token`
    #[default]
    AzureCli,
}

impl std::str::FromStr for AuthMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pat" => Ok(AuthMode::Pat),
            "azure-cli" => Ok(AuthMode::AzureCli),
            other => Err(Error::Config {
                message: format!("unknown auth mode '{other}' (expected pat or azure-cli)"),
            }),
        }
    }
}

/// Connection settings for an Azure DevOps organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdoConfig {
    /// Organization name, e.g. `contoso`
    pub organization: String,

    /// Organization URL; defaults to `https://dev.azure.com/{organization}`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Identity service URL; defaults to `https://vssps.dev.azure.com/{organization}`
    #[serde(default)]
    pub identity_url: Option<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub auth: AuthMode,

    /// Personal access token when `auth = "pat"`
    #[serde(default, skip_serializing)]
    pub pat: Option<String>,

    /// Project used when a tool call omits `project`
    #[serde(default)]
    pub default_project: Option<String>,
}

impl AdoConfig {
    /// Configuration with defaults for `organization`
    pub fn for_organization(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            base_url: None,
            identity_url: None,
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            auth: AuthMode::default(),
            pat: None,
            default_project: None,
        }
    }

    /// Parse from TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: AdoConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::parse(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.organization.trim().is_empty() {
            return Err(Error::Config {
                message: "organization must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://dev.azure.com/{}", self.organization),
        }
    }

    pub fn identity_url(&self) -> String {
        match &self.identity_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://vssps.dev.azure.com/{}", self.organization),
        }
    }

    /// Resolve the project for a call, falling back to `default_project`
    pub fn project<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str> {
        requested
            .filter(|p| !p.is_empty())
            .or(self.default_project.as_deref())
            .ok_or_else(|| Error::invalid_parameters("project is required"))
    }
}
