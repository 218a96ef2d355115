//! # widget-bridge
//!
//! Host-side bridge for MCP App widgets.
//!
//! Widgets are untrusted UI bundles rendered into an isolated surface. They
//! talk to the host over one of two wire protocols: the flat `openai:*`
//! event protocol or the JSON-RPC 2.0 protocol of the MCP Apps extension.
//! This crate provides:
//! - **Codecs**: both protocols decoded into one set of typed events
//! - **Sessions**: handshake, context diffs, display modes and widget state
//! - **Proxy**: guest tool calls forwarded to a host [`ToolExecutor`], with
//!   bearer challenge detection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use widget_bridge::{ChannelPort, ProtocolVariant, SessionSpec, Surface, WidgetBridge};
//!
//! # async fn example() {
//! let (mut bridge, mut host_events) = WidgetBridge::builder().build();
//!
//! // `to_guest` is drained into the widget's iframe or webview
//! let (port, mut to_guest) = ChannelPort::pair();
//! let spec = SessionSpec::new(ProtocolVariant::JsonRpc, "lookup", "ui://widget/lookup.html");
//! let session = bridge.open_session(spec, Arc::new(port));
//!
//! // Whatever the widget posts goes back in
//! bridge.handle_message(
//!     session,
//!     Surface::Primary,
//!     serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "ui/initialize", "params": {}}),
//! );
//! let handshake = to_guest.recv().await;
//! # }
//! ```

pub mod bridge;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod events;
pub mod geo;
pub mod pending;
pub mod protocol;
pub mod proxy;
pub mod security;
pub mod session;
pub mod sync;
pub mod transport;

pub use bridge::{BridgeInput, WidgetBridge, WidgetBridgeBuilder};
pub use config::BridgeConfig;
pub use context::{ContextDiff, Environment, HostContextSnapshot};
pub use error::{Error, Result};
pub use events::HostEvent;
pub use geo::{GeoCache, GeoLocator, UserLocation};
pub use pending::PendingReply;
pub use protocol::{DisplayMode, DisplayModeRequest, MaxHeight, ProtocolVariant};
pub use proxy::{OAuthChallenge, ToolCallOutcome, ToolCallProxy, ToolExecutor};
pub use security::CspViolationRecord;
pub use session::{SessionId, SessionSpec};
pub use sync::Surface;
pub use transport::{ChannelPort, GuestChannel};

#[cfg(feature = "mcp")]
pub use proxy::{McpExecutor, McpTarget};
