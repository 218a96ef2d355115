//! Bridge configuration
//!
//! Host-side knobs for the bridge: protocol identity, request limits and
//! the thresholds the display-mode machine and CSP collector apply.

use std::time::Duration;

use crate::protocol::{AppInfo, DisplayMode, PROTOCOL_VERSION};

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Protocol version announced in the `ui/initialize` reply
    pub protocol_version: String,

    /// Host identity announced in the `ui/initialize` reply
    pub host_info: AppInfo,

    /// How long a host -> guest request may wait for its reply
    pub request_timeout: Duration,

    /// Maximum outstanding host -> guest requests per session
    pub max_pending_requests: usize,

    /// Viewports narrower than this (in CSS px) cannot hold the floating slot
    pub narrow_viewport_width: u32,

    /// CSP violation records kept per session; oldest are dropped first
    pub csp_log_capacity: usize,

    /// Display modes advertised to JSON-RPC guests
    pub available_display_modes: Vec<DisplayMode>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            host_info: AppInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            request_timeout: Duration::from_secs(30),
            max_pending_requests: 100,
            narrow_viewport_width: 768,
            csp_log_capacity: 100,
            available_display_modes: vec![
                DisplayMode::Inline,
                DisplayMode::Floating,
                DisplayMode::Fullscreen,
            ],
        }
    }
}

impl BridgeConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the announced protocol version
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Set the announced host name and version
    pub fn with_host_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.host_info = AppInfo {
            name: name.into(),
            version: version.into(),
        };
        self
    }

    /// Set the per-request reply timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the per-session pending request cap
    pub fn with_max_pending_requests(mut self, max: usize) -> Self {
        self.max_pending_requests = max;
        self
    }

    /// Set the narrow-viewport breakpoint
    pub fn with_narrow_viewport_width(mut self, width: u32) -> Self {
        self.narrow_viewport_width = width;
        self
    }

    /// Set the per-session CSP log capacity
    pub fn with_csp_log_capacity(mut self, capacity: usize) -> Self {
        self.csp_log_capacity = capacity;
        self
    }

    /// Set the display modes advertised to guests
    pub fn with_available_display_modes(mut self, modes: Vec<DisplayMode>) -> Self {
        self.available_display_modes = modes;
        self
    }
}
