//! Wire protocols spoken by guest surfaces
//!
//! Two incompatible protocols reach the bridge: the flat `openai:*` event
//! protocol and the JSON-RPC 2.0 protocol of the MCP Apps extension. Each
//! [`Codec`] turns raw messages into canonical [`GuestEvent`]s and turns
//! canonical [`HostMessage`]s back into its own wire form.

mod flat;
mod jsonrpc;
mod messages;
mod types;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ContextDiff;

pub use flat::{tags as flat_tags, FlatCodec};
pub use jsonrpc::{JsonRpcCodec, CSP_REPORT_TYPE};
pub use messages::{
    methods, AppCapabilities, AppInfo, DisplayModeResult, HostContext, InitializeParams,
    InitializeResult, ResourceTeardownParams, ToolCancelledParams, ToolInfo, ToolInputParams,
};
pub use types::{
    error_codes, CspViolation, DisplayMode, DisplayModeRequest, MaxHeight, Platform, RequestId,
    RpcError, Theme, ToolCallRequest, JSONRPC_VERSION, PROTOCOL_VERSION,
};

/// Which wire protocol a guest speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolVariant {
    /// `{type: "openai:*", ...}` events
    Flat,
    /// JSON-RPC 2.0 (`ui/*` methods)
    JsonRpc,
}

impl ProtocolVariant {
    /// The codec for this protocol
    pub fn codec(&self) -> &'static dyn Codec {
        match self {
            ProtocolVariant::Flat => &FlatCodec,
            ProtocolVariant::JsonRpc => &JsonRpcCodec,
        }
    }
}

/// Translation between one wire protocol and canonical events
pub trait Codec: Send + Sync {
    /// Decode a raw inbound message. Malformed or unrecognized input yields
    /// `None`; decoding never panics on guest data.
    fn decode(&self, raw: &Value) -> Option<GuestEvent>;

    /// Encode an outbound message, or `None` if this protocol has no wire
    /// form for it.
    fn encode(&self, message: &HostMessage) -> Option<Value>;
}

/// Canonical form of anything a guest sends
#[derive(Debug, Clone, PartialEq)]
pub enum GuestEvent {
    /// Expects exactly one reply carrying `id`
    Request { id: RequestId, call: GuestCall },
    /// Reply to a request the host issued
    Response {
        id: RequestId,
        outcome: std::result::Result<Value, RpcError>,
    },
    /// Fire-and-forget
    Notification(GuestNotice),
    /// CSP violation report
    SecuritySignal(CspViolation),
}

/// Requests a guest may make. Anything outside this table is `Unsupported`.
#[derive(Debug, Clone, PartialEq)]
pub enum GuestCall {
    Initialize(InitializeParams),
    CallTool(ToolCallRequest),
    ReadResource { uri: String },
    OpenLink { url: String },
    Message { role: String, text: Option<String> },
    RequestDisplayMode(DisplayModeRequest),
    UpdateModelContext(Value),
    /// Known method, params failed validation
    Invalid { method: String, reason: String },
    /// Unknown method; answered with method-not-found
    Unsupported { method: String },
}

/// Notifications a guest may send
#[derive(Debug, Clone, PartialEq)]
pub enum GuestNotice {
    Initialized,
    Resized { height: f64 },
    Log { level: Option<String>, data: Value },
    SetWidgetState { tool_id: Option<String>, state: Value },
    Followup { message: String },
    RequestDisplayMode(DisplayModeRequest),
    RequestClose,
    OpenExternal { href: String },
    RequestModal { title: Option<String>, params: Value },
}

/// Canonical form of anything the host sends
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    /// Answer to a guest request
    Reply {
        id: RequestId,
        outcome: std::result::Result<Value, RpcError>,
    },
    /// Host request awaiting a guest reply
    Request {
        id: RequestId,
        method: String,
        params: Value,
    },
    /// Host notification with a protocol-specific method name
    Notification { method: String, params: Value },
    /// Changed host context fields
    ContextChanged(ContextDiff),
    /// Mirrored widget state
    PushWidgetState { tool_id: Option<String>, state: Value },
}
