//! Widget inspection example
//!
//! Connects to an MCP server, opens a JSON-RPC widget session and plays the
//! guest side by hand: handshake, then a proxied tool call.
//!
//! Start any MCP server exposing an `add` tool on port 8080, then run:
//! ```
//! cargo run --example inspect_widget
//! ```

use std::sync::Arc;

use serde_json::json;
use widget_bridge::{
    ChannelPort, McpExecutor, McpTarget, ProtocolVariant, SessionSpec, Surface, WidgetBridge,
};

#[tokio::main]
async fn main() -> widget_bridge::Result<()> {
    eprintln!("Connecting to MCP server at http://127.0.0.1:8080/mcp ...");
    let executor = McpExecutor::connect(McpTarget::http("http://127.0.0.1:8080/mcp")).await?;

    let (mut bridge, mut host_events) = WidgetBridge::builder()
        .with_executor(Arc::new(executor))
        .build();

    let (port, mut to_guest) = ChannelPort::pair();
    let spec = SessionSpec::new(ProtocolVariant::JsonRpc, "add", "ui://widget/add.html")
        .with_tool_input(json!({"a": 17, "b": 25}));
    let session = bridge.open_session(spec, Arc::new(port));

    // Guest handshake
    bridge.handle_message(
        session,
        Surface::Primary,
        json!({"jsonrpc": "2.0", "id": 1, "method": "ui/initialize", "params": {}}),
    );
    if let Some(reply) = to_guest.recv().await {
        eprintln!("handshake: {}", serde_json::to_string_pretty(&reply)?);
    }

    // Guest asks the host to run a tool
    bridge.handle_message(
        session,
        Surface::Primary,
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "add", "arguments": {"a": 1, "b": 2}}}),
    );
    if let Some(reply) = to_guest.recv().await {
        eprintln!("tool reply: {}", reply);
    }

    while let Ok(event) = host_events.try_recv() {
        eprintln!("host event: {:?}", event);
    }

    bridge.close_session(session)?;
    Ok(())
}
