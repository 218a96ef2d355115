//! JSON-RPC payloads exchanged with MCP App guests
//!
//! Typed params and results for the `ui/*` methods the bridge speaks, plus
//! the method-name table both directions are checked against.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::DisplayMode;
use crate::context::{DeviceCapabilities, HostContextSnapshot, SafeAreaInsets, Viewport};
use crate::geo::UserLocation;
use crate::protocol::{Platform, Theme};

/// Capabilities declared by a guest during initialization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_display_modes: Option<Vec<DisplayMode>>,
}

/// Guest -> Host: `ui/initialize` params. Every field is optional so a
/// sloppy guest still gets its handshake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitializeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_capabilities: Option<AppCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_info: Option<AppInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}

/// Host -> Guest: reply to `ui/initialize`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub host_capabilities: Value,
    pub host_info: AppInfo,
    pub host_context: HostContext,
}

/// Tool the widget was rendered for
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub name: String,
    pub resource_uri: String,
}

/// Full host context folded into the handshake
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostContext {
    pub tool_info: ToolInfo,
    pub theme: Theme,
    pub display_mode: DisplayMode,
    pub available_display_modes: Vec<DisplayMode>,
    pub locale: String,
    pub time_zone: String,
    pub platform: Platform,
    pub viewport: Viewport,
    pub device_capabilities: DeviceCapabilities,
    pub safe_area_insets: SafeAreaInsets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_location: Option<UserLocation>,
}

impl HostContext {
    pub fn new(
        snapshot: &HostContextSnapshot,
        tool_info: ToolInfo,
        available_display_modes: Vec<DisplayMode>,
        user_location: Option<UserLocation>,
    ) -> Self {
        Self {
            tool_info,
            theme: snapshot.theme,
            display_mode: snapshot.display_mode,
            available_display_modes,
            locale: snapshot.locale.clone(),
            time_zone: snapshot.time_zone.clone(),
            platform: snapshot.platform,
            viewport: snapshot.viewport,
            device_capabilities: snapshot.device_capabilities,
            safe_area_insets: snapshot.safe_area_insets,
            user_location,
        }
    }
}

/// Host -> Guest: complete tool arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputParams {
    pub arguments: Value,
}

/// Host -> Guest: tool was cancelled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCancelledParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Host -> Guest: reply to `ui/request-display-mode`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayModeResult {
    pub mode: DisplayMode,
}

/// Host -> Guest: graceful teardown request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTeardownParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// All bridge method names as constants
pub mod methods {
    // Guest requests (require response)
    pub const INITIALIZE: &str = "ui/initialize";
    pub const TOOLS_CALL: &str = "tools/call";
    pub const RESOURCES_READ: &str = "resources/read";
    pub const OPEN_LINK: &str = "ui/open-link";
    pub const MESSAGE: &str = "ui/message";
    pub const REQUEST_DISPLAY_MODE: &str = "ui/request-display-mode";
    pub const UPDATE_MODEL_CONTEXT: &str = "ui/update-model-context";

    // Guest notifications
    pub const INITIALIZED: &str = "ui/notifications/initialized";
    pub const SIZE_CHANGED: &str = "ui/notifications/size-changed";
    pub const SIZE_CHANGE_LEGACY: &str = "ui/notifications/size-change";
    pub const LOG_MESSAGE: &str = "notifications/message";

    // Host -> guest
    pub const TOOL_INPUT: &str = "ui/notifications/tool-input";
    pub const TOOL_RESULT: &str = "ui/notifications/tool-result";
    pub const TOOL_CANCELLED: &str = "ui/notifications/tool-cancelled";
    pub const HOST_CONTEXT_CHANGED: &str = "ui/notifications/host-context-changed";
    pub const RESOURCE_TEARDOWN: &str = "ui/resource-teardown";
}
