//! Error types for widget-bridge

use thiserror::Error;

use crate::protocol::{error_codes, RpcError};

/// Result type alias for widget-bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for bridge operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transport error (guest surface gone, channel closed, etc.)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol error (message cannot be expressed in the session's protocol)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Tool or resource execution failed on the host side
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The guest answered a host request with an error
    #[error("Guest error {code}: {message}")]
    Remote { code: i64, message: String },

    /// A host request got no reply within the configured timeout
    #[error("Request {0} timed out")]
    Timeout(String),

    /// No live session with that id
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The session was closed while a request was outstanding
    #[error("Session closed")]
    SessionClosed,

    /// The operation has no meaning for this session or host configuration
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Too many host requests are waiting on one guest
    #[error("Pending request limit reached ({0})")]
    PendingLimit(usize),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// rmcp error
    #[cfg(feature = "mcp")]
    #[error("MCP error: {0}")]
    Mcp(#[from] rmcp::ErrorData),
}

impl Error {
    /// JSON-RPC error code used when this error answers a guest request
    pub fn rpc_code(&self) -> i64 {
        match self {
            Error::Unsupported(_) => error_codes::METHOD_NOT_FOUND,
            Error::Remote { code, .. } => *code,
            Error::Serialization(_) => error_codes::INVALID_PARAMS,
            _ => error_codes::SERVER_ERROR,
        }
    }

    /// Whether the failure came from a request that never got an answer
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

impl From<RpcError> for Error {
    fn from(err: RpcError) -> Self {
        Error::Remote {
            code: err.code,
            message: err.message,
        }
    }
}

impl From<&Error> for RpcError {
    fn from(err: &Error) -> Self {
        let message = match err {
            Error::ToolExecution(msg) | Error::Unsupported(msg) => msg.clone(),
            Error::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        };
        RpcError::new(err.rpc_code(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ToolExecution("boom".to_string());
        assert_eq!(err.to_string(), "Tool execution failed: boom");

        let err = Error::Remote {
            code: -32000,
            message: "nope".to_string(),
        };
        assert_eq!(err.to_string(), "Guest error -32000: nope");
    }

    #[test]
    fn test_rpc_codes() {
        assert_eq!(Error::Unsupported("x".into()).rpc_code(), -32601);
        assert_eq!(Error::ToolExecution("x".into()).rpc_code(), -32000);
        assert_eq!(Error::Timeout("1".into()).rpc_code(), -32000);
    }

    #[test]
    fn test_rpc_error_keeps_bare_message() {
        let rpc = RpcError::from(&Error::Unsupported("Tool calls not supported".into()));
        assert_eq!(rpc.code, -32601);
        assert_eq!(rpc.message, "Tool calls not supported");
    }

    #[test]
    fn test_from_remote() {
        let err: Error = RpcError::new(-32602, "bad params").into();
        assert!(matches!(err, Error::Remote { code: -32602, .. }));
        assert!(!err.is_timeout());
        assert!(Error::Timeout("3".into()).is_timeout());
    }
}
