//! Tool executor backed by a live MCP server connection

use async_trait::async_trait;
use rmcp::{
    model::{
        CallToolRequestParams, ClientInfo, ExtensionCapabilities, Implementation, Meta,
        ReadResourceRequestParams,
    },
    service::RunningService,
    transport::{ConfigureCommandExt, StreamableHttpClientTransport, TokioChildProcess},
    ClientHandler, RoleClient, ServiceExt,
};
use serde_json::Value;
use tokio::process::Command;

use super::ToolExecutor;
use crate::error::{Error, Result};
use crate::protocol::ToolCallRequest;

/// Extension id for MCP Apps UI support
const UI_EXTENSION: &str = "io.modelcontextprotocol/ui";

/// Advertises the UI extension during initialize so servers expose
/// their widget-bearing tools.
struct BridgeClientHandler;

impl ClientHandler for BridgeClientHandler {
    fn get_info(&self) -> ClientInfo {
        let mut ext = ExtensionCapabilities::new();
        let mut ui = serde_json::Map::new();
        ui.insert(
            "mimeTypes".to_string(),
            serde_json::json!(["text/html;profile=mcp-app"]),
        );
        ext.insert(UI_EXTENSION.to_string(), ui);

        ClientInfo {
            protocol_version: Default::default(),
            capabilities: rmcp::model::ClientCapabilities::builder()
                .enable_extensions_with(ext)
                .build(),
            client_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Where the MCP server lives
#[derive(Debug, Clone)]
pub enum McpTarget {
    /// Streamable HTTP endpoint
    Http(String),
    /// Child process speaking MCP over stdio
    Stdio { command: String, args: Vec<String> },
}

impl McpTarget {
    pub fn http(url: impl Into<String>) -> Self {
        Self::Http(url.into())
    }

    /// Parse a command line such as `npx @acme/widgets-server --port 0`
    pub fn stdio(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(String::from);
        let command = parts
            .next()
            .ok_or_else(|| Error::Transport("Empty command".to_string()))?;
        Ok(Self::Stdio {
            command,
            args: parts.collect(),
        })
    }
}

/// [`ToolExecutor`] that forwards to an MCP server through rmcp
pub struct McpExecutor {
    service: RunningService<RoleClient, BridgeClientHandler>,
}

impl McpExecutor {
    pub async fn connect(target: McpTarget) -> Result<Self> {
        let service = match &target {
            McpTarget::Http(url) => {
                let transport = StreamableHttpClientTransport::from_uri(url.clone());
                BridgeClientHandler.serve(transport).await.map_err(|e| {
                    Error::Transport(format!(
                        "Failed to connect to HTTP MCP server at {}: {}",
                        url, e
                    ))
                })?
            }
            McpTarget::Stdio { command, args } => {
                let transport = TokioChildProcess::new(Command::new(command).configure(|cmd| {
                    cmd.args(args);
                }))
                .map_err(|e| {
                    Error::Transport(format!("Failed to spawn process '{}': {}", command, e))
                })?;
                BridgeClientHandler.serve(transport).await.map_err(|e| {
                    Error::Transport(format!(
                        "Failed to connect to stdio MCP server '{}': {}",
                        command, e
                    ))
                })?
            }
        };

        tracing::info!(target = ?target, "connected tool executor");
        Ok(Self { service })
    }

    /// Close the server connection
    pub async fn close(self) -> Result<()> {
        self.service
            .cancel()
            .await
            .map_err(|e| Error::Transport(format!("Failed to close connection: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl ToolExecutor for McpExecutor {
    async fn call_tool(&self, request: &ToolCallRequest) -> Result<Value> {
        let result = self
            .service
            .call_tool(CallToolRequestParams {
                meta: request
                    .meta
                    .as_ref()
                    .and_then(Value::as_object)
                    .cloned()
                    .map(Meta),
                name: request.name.clone().into(),
                arguments: request.arguments.as_object().cloned(),
                task: None,
            })
            .await
            .map_err(|e| {
                Error::ToolExecution(format!("Failed to call tool '{}': {}", request.name, e))
            })?;
        Ok(serde_json::to_value(result)?)
    }

    async fn read_resource(&self, uri: &str) -> Result<Value> {
        let result = self
            .service
            .read_resource(ReadResourceRequestParams {
                meta: None,
                uri: uri.to_string(),
            })
            .await
            .map_err(|e| Error::ResourceNotFound(format!("Failed to read resource '{}': {}", uri, e)))?;
        Ok(serde_json::to_value(result)?)
    }
}
