//! Tool call proxy
//!
//! Guests never reach an MCP server directly. Their `tools/call` and
//! `resources/read` requests go through [`ToolCallProxy`], which forwards
//! them to the host's [`ToolExecutor`], normalizes every failure to one
//! error string and looks for bearer challenges in the result.

mod challenge;
#[cfg(feature = "mcp")]
mod mcp;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::protocol::{RpcError, ToolCallRequest};

pub use challenge::{
    challenge_from_result, parse_bearer_challenge, OAuthChallenge, WWW_AUTHENTICATE_META_KEY,
};
#[cfg(feature = "mcp")]
pub use mcp::{McpExecutor, McpTarget};

/// Reply to a tool call when the host has no execution facility
pub const TOOL_CALLS_NOT_SUPPORTED: &str = "Tool calls not supported";

/// Reply to a resource read when the host has no execution facility
pub const RESOURCE_READS_NOT_SUPPORTED: &str = "Resource reads not supported";

const GENERIC_TOOL_FAILURE: &str = "Tool execution failed";

/// The host's facility for actually running tools and reading resources.
///
/// Results are MCP-shaped JSON (`CallToolResult`, `ReadResourceResult`).
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run a tool
    async fn call_tool(&self, request: &ToolCallRequest) -> Result<Value>;

    /// Read a resource by URI
    async fn read_resource(&self, uri: &str) -> Result<Value>;
}

/// What the proxy hands back for one guest request
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallOutcome {
    pub result: std::result::Result<Value, RpcError>,
    /// Present when the result carried an auth challenge; never blocks `result`
    pub challenge: Option<OAuthChallenge>,
}

impl ToolCallOutcome {
    fn failed(error: RpcError) -> Self {
        Self {
            result: Err(error),
            challenge: None,
        }
    }
}

/// Forwards guest tool and resource requests to the configured executor
#[derive(Clone, Default)]
pub struct ToolCallProxy {
    executor: Option<Arc<dyn ToolExecutor>>,
}

impl ToolCallProxy {
    pub fn new(executor: Arc<dyn ToolExecutor>) -> Self {
        Self {
            executor: Some(executor),
        }
    }

    /// A proxy that answers everything with "not supported"
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.executor.is_some()
    }

    /// Forward a tool call. Always yields exactly one result or error.
    pub async fn call_tool(&self, request: ToolCallRequest) -> ToolCallOutcome {
        let Some(executor) = &self.executor else {
            return ToolCallOutcome::failed(RpcError::method_not_found(TOOL_CALLS_NOT_SUPPORTED));
        };

        match executor.call_tool(&request).await {
            Ok(result) => {
                let challenge = challenge_from_result(&result);
                let result = if is_error_result(&result) {
                    Err(RpcError::execution(error_text(&result)))
                } else {
                    Ok(result)
                };
                ToolCallOutcome { result, challenge }
            }
            Err(e) => {
                tracing::warn!(tool = %request.name, error = %e, "proxied tool call failed");
                ToolCallOutcome::failed(RpcError::execution(normalize(&e)))
            }
        }
    }

    /// Forward a resource read
    pub async fn read_resource(&self, uri: &str) -> ToolCallOutcome {
        let Some(executor) = &self.executor else {
            return ToolCallOutcome::failed(RpcError::method_not_found(RESOURCE_READS_NOT_SUPPORTED));
        };

        match executor.read_resource(uri).await {
            Ok(result) => ToolCallOutcome {
                result: Ok(result),
                challenge: None,
            },
            Err(e) => {
                tracing::warn!(uri = %uri, error = %e, "proxied resource read failed");
                ToolCallOutcome::failed(RpcError::execution(normalize(&e)))
            }
        }
    }
}

impl std::fmt::Debug for ToolCallProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCallProxy")
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn is_error_result(result: &Value) -> bool {
    result.get("isError").and_then(Value::as_bool).unwrap_or(false)
}

/// First text block of a failed result, else a fixed message
fn error_text(result: &Value) -> String {
    result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|blocks| {
            blocks.iter().find_map(|block| {
                (block.get("type").and_then(Value::as_str) == Some("text"))
                    .then(|| block.get("text").and_then(Value::as_str))
                    .flatten()
            })
        })
        .filter(|text| !text.is_empty())
        .unwrap_or(GENERIC_TOOL_FAILURE)
        .to_string()
}

fn normalize(err: &Error) -> String {
    match err {
        Error::ToolExecution(msg) | Error::ResourceNotFound(msg) => msg.clone(),
        other => other.to_string(),
    }
}
