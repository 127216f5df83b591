//! Azure DevOps MCP Server
//!
//! A Model Context Protocol server that exposes Azure DevOps Git data to
//! agentic IDEs and other MCP clients.
//!
//! # Usage
//!
//! ```bash
//! ado-mcp --organization contoso [--config ado-mcp.toml] [--auth pat|azure-cli]
//! ```
//!
//! # Environment Variables
//!
//! - `ADO_MCP_ORGANIZATION`: organization when `--organization` is omitted
//! - `ADO_MCP_PAT`: personal access token for `--auth pat`
//! - `RUST_LOG`: Control log verbosity (default: `ado_mcp=info`)
//!
//! # Protocol
//!
//! The server communicates via JSON-RPC 2.0 over stdio:
//! - Requests/responses go through stdout
//! - Logs go to stderr (to avoid interfering with the protocol)

use std::path::PathBuf;
use std::sync::Arc;

use ado_core::{AdoConfig, AuthMode, HttpConnectionProvider, auth};
use ado_mcp::AdoMcpServer;
use clap::Parser;

/// MCP server for Azure DevOps
#[derive(Parser)]
#[command(name = "ado-mcp")]
#[command(about = "MCP server for Azure DevOps Git data")]
#[command(version)]
struct Args {
    /// Azure DevOps organization name
    #[arg(short, long, env = "ADO_MCP_ORGANIZATION")]
    organization: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Credential source: pat or azure-cli
    #[arg(long)]
    auth: Option<AuthMode>,

    /// Organization URL, for Azure DevOps Server or proxies
    #[arg(long)]
    base_url: Option<String>,

    /// Project used when a tool call omits one
    #[arg(long)]
    default_project: Option<String>,
}

impl Args {
    /// Load the config file if given, then apply command-line overrides
    fn into_config(self) -> ado_core::Result<AdoConfig> {
        let mut config = match (&self.config, &self.organization) {
            (Some(path), _) => AdoConfig::load(path)?,
            (None, Some(organization)) => AdoConfig::for_organization(organization.clone()),
            (None, None) => {
                return Err(ado_core::Error::Config {
                    message: "an organization is required (--organization, ADO_MCP_ORGANIZATION, or --config)"
                        .to_string(),
                });
            }
        };

        if let Some(organization) = self.organization {
            config.organization = organization;
        }
        if let Some(auth) = self.auth {
            config.auth = auth;
        }
        if self.base_url.is_some() {
            config.base_url = self.base_url;
        }
        if self.default_project.is_some() {
            config.default_project = self.default_project;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging to stderr (stdout is reserved for MCP protocol)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ado_mcp=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config()?;

    tracing::info!(
        organization = %config.organization,
        auth = ?config.auth,
        "Starting ado-mcp server"
    );

    let tokens = auth::token_provider(&config)?;
    let connections = Arc::new(HttpConnectionProvider::new(config.clone(), tokens));
    let server = AdoMcpServer::new(Arc::new(config), connections)?;
    server.run().await?;

    Ok(())
}
