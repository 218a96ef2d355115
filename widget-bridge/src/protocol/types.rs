//! Shared protocol types
//!
//! Typed representations every inbound field is decoded into before the
//! dispatcher looks at it, plus the JSON-RPC error envelope both codecs use
//! for replies.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Protocol version announced to JSON-RPC guests
pub const PROTOCOL_VERSION: &str = "2026-01-26";

/// JSON-RPC version tag
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes used by the bridge
pub mod error_codes {
    /// Invalid params
    pub const INVALID_PARAMS: i64 = -32602;
    /// Method not found / not supported by this host
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Implementation-defined execution failure
    pub const SERVER_ERROR: i64 = -32000;
}

/// Presentation of a widget
///
/// `Floating` is the single picture-in-picture slot; it travels as `pip` on
/// both wires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Inline,
    #[serde(rename = "pip", alias = "floating")]
    Floating,
    Fullscreen,
}

impl DisplayMode {
    /// Parse a wire mode name
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "inline" => Some(DisplayMode::Inline),
            "pip" | "floating" => Some(DisplayMode::Floating),
            "fullscreen" => Some(DisplayMode::Fullscreen),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Inline => "inline",
            DisplayMode::Floating => "pip",
            DisplayMode::Fullscreen => "fullscreen",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Height constraint that travels with a display mode.
///
/// `Default` means the guest never said anything; `Unconstrained` means it
/// explicitly sent `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum MaxHeight {
    #[default]
    Default,
    Unconstrained,
    Limit(f64),
}

impl MaxHeight {
    /// Read `key` from a message object. `None` when the field has the wrong type.
    pub fn from_field(obj: &Map<String, Value>, key: &str) -> Option<Self> {
        match obj.get(key) {
            None => Some(MaxHeight::Default),
            Some(Value::Null) => Some(MaxHeight::Unconstrained),
            Some(Value::Number(n)) => n.as_f64().filter(|h| *h >= 0.0).map(MaxHeight::Limit),
            Some(_) => None,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, MaxHeight::Default)
    }

    /// Wire value; `Default` and `Unconstrained` both read as `null`
    pub fn to_value(&self) -> Value {
        match self {
            MaxHeight::Limit(h) => Value::from(*h),
            _ => Value::Null,
        }
    }
}

impl Serialize for MaxHeight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MaxHeight::Limit(h) => serializer.serialize_f64(*h),
            _ => serializer.serialize_none(),
        }
    }
}

/// Color scheme of the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Kind of device the host runs on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Web,
    Desktop,
    Mobile,
}

/// Correlation id of a request, as sent on the wire
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    Text(String),
}

impl RequestId {
    /// Accept integer or string ids; anything else is malformed
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RequestId::Number),
            Value::String(s) => Some(RequestId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RequestId::Number(n) => Value::from(*n),
            RequestId::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id)
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(error_codes::METHOD_NOT_FOUND, message)
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_PARAMS, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(error_codes::SERVER_ERROR, message)
    }
}

/// A guest's request to run a tool through the host
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: Value,
    pub meta: Option<Value>,
}

/// A request to change presentation, from the guest or the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayModeRequest {
    pub mode: DisplayMode,
    pub max_height: MaxHeight,
}

impl DisplayModeRequest {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            max_height: MaxHeight::Default,
        }
    }

    pub fn with_max_height(mut self, max_height: MaxHeight) -> Self {
        self.max_height = max_height;
        self
    }
}

/// A Content-Security-Policy violation reported by a guest surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CspViolation {
    pub directive: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_directive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
}

impl CspViolation {
    /// Decode a report object. Shared by both codecs since the report shape
    /// does not depend on the protocol.
    pub fn from_report(obj: &Map<String, Value>) -> Option<Self> {
        let directive = str_field(obj, "directive")
            .or_else(|| str_field(obj, "violatedDirective"))?
            .to_string();
        Some(Self {
            directive,
            effective_directive: str_field(obj, "effectiveDirective").map(String::from),
            blocked_uri: str_field(obj, "blockedUri")
                .or_else(|| str_field(obj, "blockedURI"))
                .map(String::from),
            source_file: str_field(obj, "sourceFile").map(String::from),
            line_number: u32_field(obj, "lineNumber"),
            column_number: u32_field(obj, "columnNumber"),
        })
    }
}

pub(crate) fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

pub(crate) fn u32_field(obj: &Map<String, Value>, key: &str) -> Option<u32> {
    obj.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

pub(crate) fn f64_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_mode_wire_names() {
        assert_eq!(serde_json::to_value(DisplayMode::Floating).unwrap(), json!("pip"));
        assert_eq!(
            serde_json::from_value::<DisplayMode>(json!("floating")).unwrap(),
            DisplayMode::Floating
        );
        assert_eq!(DisplayMode::parse("fullscreen"), Some(DisplayMode::Fullscreen));
        assert_eq!(DisplayMode::parse("carousel"), None);
    }

    #[test]
    fn test_max_height_tri_state() {
        let obj = json!({"a": 320, "b": null, "c": "tall"});
        let obj = obj.as_object().unwrap();
        assert_eq!(MaxHeight::from_field(obj, "a"), Some(MaxHeight::Limit(320.0)));
        assert_eq!(MaxHeight::from_field(obj, "b"), Some(MaxHeight::Unconstrained));
        assert_eq!(MaxHeight::from_field(obj, "missing"), Some(MaxHeight::Default));
        assert_eq!(MaxHeight::from_field(obj, "c"), None);
    }

    #[test]
    fn test_request_id_shapes() {
        assert_eq!(RequestId::from_value(&json!(7)), Some(RequestId::Number(7)));
        assert_eq!(
            RequestId::from_value(&json!("call-1")),
            Some(RequestId::Text("call-1".into()))
        );
        assert_eq!(RequestId::from_value(&json!(null)), None);
        assert_eq!(RequestId::from_value(&json!(1.5)), None);
    }

    #[test]
    fn test_csp_report_requires_directive() {
        let report = json!({
            "directive": "script-src",
            "blockedUri": "https://evil.example/x.js",
            "lineNumber": 12
        });
        let violation = CspViolation::from_report(report.as_object().unwrap()).unwrap();
        assert_eq!(violation.directive, "script-src");
        assert_eq!(violation.line_number, Some(12));
        assert!(CspViolation::from_report(json!({"blockedUri": "x"}).as_object().unwrap()).is_none());
    }
}
