//! MCP Server implementation
//!
//! Reads one JSON-RPC message per line and writes one response per line.
//! Notifications produce no output.

use std::sync::Arc;

use ado_core::{AdoConfig, ConnectionProvider};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::handlers::ToolContext;
use crate::protocol::{
    InitializeResult, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION, ServerCapabilities,
    ServerInfo, ToolCallParams, ToolsCapability, codes,
};
use crate::registry::ToolRegistry;
use crate::{Error, Result};

/// MCP Server for Azure DevOps
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use ado_core::{AdoConfig, HttpConnectionProvider, auth};
/// use ado_mcp::AdoMcpServer;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = AdoConfig::for_organization("contoso");
///     let tokens = auth::token_provider(&config)?;
///     let connections = Arc::new(HttpConnectionProvider::new(config.clone(), tokens));
///     AdoMcpServer::new(Arc::new(config), connections)?.run().await?;
///     Ok(())
/// }
/// ```
pub struct AdoMcpServer {
    registry: ToolRegistry,
    context: ToolContext,
}

impl AdoMcpServer {
    pub fn new(config: Arc<AdoConfig>, connections: Arc<dyn ConnectionProvider>) -> Result<Self> {
        Ok(Self {
            registry: ToolRegistry::new()?,
            context: ToolContext::new(config, connections),
        })
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve MCP over stdin/stdout until stdin closes
    pub async fn run(&self) -> Result<()> {
        tracing::info!(
            organization = %self.context.config.organization,
            tools = self.registry.len(),
            "MCP server ready, listening on stdio"
        );
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve MCP over an arbitrary line-oriented transport
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            tracing::debug!(request = %line, "Received message");

            let response = match self.handle_message(line).await {
                Ok(response) => response,
                Err(e) => {
                    let error = JsonRpcResponse::error(
                        None,
                        codes::INTERNAL_ERROR,
                        format!("Internal error: {e}"),
                    );
                    serde_json::to_string(&error)?
                }
            };

            if !response.is_empty() {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        tracing::info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle a single MCP message
    ///
    /// Returns the serialized response, or an empty string for notifications.
    pub async fn handle_message(&self, message: &str) -> Result<String> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable message");
                let response =
                    JsonRpcResponse::error(None, codes::PARSE_ERROR, format!("Parse error: {e}"));
                return serde_json::to_string(&response).map_err(Error::from);
            }
        };

        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification, no response");
            return Ok(String::new());
        }

        if request.jsonrpc != "2.0" {
            let response = JsonRpcResponse::error(
                request.id,
                codes::INVALID_REQUEST,
                format!("Invalid Request: unsupported jsonrpc version '{}'", request.jsonrpc),
            );
            return serde_json::to_string(&response).map_err(Error::from);
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id)?,
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id)?,
            "tools/call" => self.handle_tools_call(request.id, request.params).await?,
            _ => JsonRpcResponse::error(
                request.id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        serde_json::to_string(&response).map_err(Error::from)
    }

    fn handle_initialize(&self, id: Option<Value>) -> Result<JsonRpcResponse> {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "ado-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }

    fn handle_tools_list(&self, id: Option<Value>) -> Result<JsonRpcResponse> {
        let tools: Vec<&_> = self.registry.definitions().collect();
        Ok(JsonRpcResponse::success(id, json!({ "tools": tools })))
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> Result<JsonRpcResponse> {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return Ok(JsonRpcResponse::error(
                    id,
                    codes::INVALID_PARAMS,
                    format!("Invalid params: {e}"),
                ));
            }
        };

        let result = self
            .registry
            .dispatch(&self.context, &params.name, params.arguments)
            .await;
        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ado_test_utils::FakeBackend;

    fn server() -> AdoMcpServer {
        let backend = FakeBackend::new().shared();
        AdoMcpServer::new(
            Arc::new(AdoConfig::for_organization("contoso")),
            backend.provider(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_initialize_reports_server_info() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed["id"], 1);
        assert_eq!(parsed["result"]["serverInfo"]["name"], "ado-mcp");
        assert_eq!(parsed["result"]["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_notifications_produce_no_output() {
        let server = server();
        for message in [
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":3}}"#,
        ] {
            assert!(server.handle_message(message).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_id_less_requests_are_notifications() {
        let server = server();
        for message in [
            r#"{"jsonrpc":"2.0","method":"ping"}"#,
            r#"{"jsonrpc":"2.0","method":"tools/list"}"#,
            r#"{"jsonrpc":"2.0","method":"initialize","params":{}}"#,
            r#"{"jsonrpc":"1.0","method":"ping"}"#,
        ] {
            assert!(server.handle_message(message).await.unwrap().is_empty(), "{message}");
        }
    }

    #[tokio::test]
    async fn test_unparseable_message_is_parse_error() {
        let response = server().handle_message(r#"{"invalid json"#).await.unwrap();
        let parsed: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed["error"]["code"], codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version_is_invalid_request() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"1.0","id":2,"method":"ping"}"#)
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(parsed["error"]["code"], codes::INVALID_REQUEST);
    }
}
