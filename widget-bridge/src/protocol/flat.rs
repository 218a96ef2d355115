//! Flat event protocol (`{type: "openai:*", ...}`)

use serde_json::{json, Map, Value};

use super::types::{f64_field, str_field};
use super::{
    Codec, CspViolation, DisplayMode, DisplayModeRequest, GuestEvent, GuestNotice, GuestCall,
    HostMessage, MaxHeight, RequestId, ToolCallRequest,
};
use crate::context::ContextDiff;

/// Message type tags
pub mod tags {
    // Guest -> host
    pub const RESIZE: &str = "openai:resize";
    pub const SET_WIDGET_STATE: &str = "openai:setWidgetState";
    pub const CALL_TOOL: &str = "openai:callTool";
    pub const SEND_FOLLOWUP: &str = "openai:sendFollowup";
    pub const REQUEST_DISPLAY_MODE: &str = "openai:requestDisplayMode";
    pub const REQUEST_CLOSE: &str = "openai:requestClose";
    pub const OPEN_EXTERNAL: &str = "openai:openExternal";
    pub const REQUEST_MODAL: &str = "openai:requestModal";
    pub const CSP_VIOLATION: &str = "openai:csp-violation";

    // Host -> guest
    pub const CALL_TOOL_RESPONSE: &str = "openai:callTool:response";
    pub const PUSH_WIDGET_STATE: &str = "openai:pushWidgetState";
    pub const SET_GLOBALS: &str = "openai:set_globals";
}

/// Codec for the flat event protocol.
///
/// Only `callTool` expects a reply; it is correlated by `callId`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatCodec;

impl Codec for FlatCodec {
    fn decode(&self, raw: &Value) -> Option<GuestEvent> {
        let obj = raw.as_object()?;
        let kind = str_field(obj, "type")?;

        let event = match kind {
            tags::RESIZE => GuestEvent::Notification(GuestNotice::Resized {
                height: f64_field(obj, "height")?,
            }),
            tags::SET_WIDGET_STATE => GuestEvent::Notification(GuestNotice::SetWidgetState {
                tool_id: str_field(obj, "toolId").map(String::from),
                state: obj.get("state")?.clone(),
            }),
            tags::CALL_TOOL => {
                let id = RequestId::from_value(obj.get("callId")?)?;
                let name = str_field(obj, "toolName")?.to_string();
                let arguments = match obj.get("args").or_else(|| obj.get("params")) {
                    None | Some(Value::Null) => Value::Object(Map::new()),
                    Some(args @ Value::Object(_)) => args.clone(),
                    Some(_) => return None,
                };
                GuestEvent::Request {
                    id,
                    call: GuestCall::CallTool(ToolCallRequest {
                        name,
                        arguments,
                        meta: obj.get("_meta").filter(|m| !m.is_null()).cloned(),
                    }),
                }
            }
            tags::SEND_FOLLOWUP => GuestEvent::Notification(GuestNotice::Followup {
                message: followup_text(obj.get("message")?)?,
            }),
            tags::REQUEST_DISPLAY_MODE => {
                let mode = DisplayMode::parse(str_field(obj, "mode")?)?;
                let max_height = MaxHeight::from_field(obj, "maxHeight")?;
                GuestEvent::Notification(GuestNotice::RequestDisplayMode(
                    DisplayModeRequest::new(mode).with_max_height(max_height),
                ))
            }
            tags::REQUEST_CLOSE => GuestEvent::Notification(GuestNotice::RequestClose),
            tags::OPEN_EXTERNAL => GuestEvent::Notification(GuestNotice::OpenExternal {
                href: str_field(obj, "href")?.to_string(),
            }),
            tags::REQUEST_MODAL => GuestEvent::Notification(GuestNotice::RequestModal {
                title: str_field(obj, "title").map(String::from),
                params: obj.get("params").cloned().unwrap_or(Value::Null),
            }),
            tags::CSP_VIOLATION => GuestEvent::SecuritySignal(CspViolation::from_report(obj)?),
            _ => return None,
        };
        Some(event)
    }

    fn encode(&self, message: &HostMessage) -> Option<Value> {
        match message {
            HostMessage::Reply { id, outcome } => {
                let mut out = json!({
                    "type": tags::CALL_TOOL_RESPONSE,
                    "callId": id.to_value(),
                });
                match outcome {
                    Ok(result) => out["result"] = result.clone(),
                    Err(err) => out["error"] = Value::from(err.message.as_str()),
                }
                Some(out)
            }
            HostMessage::ContextChanged(diff) => {
                let globals = globals(diff);
                if globals.is_empty() {
                    return None;
                }
                Some(json!({ "type": tags::SET_GLOBALS, "globals": globals }))
            }
            HostMessage::PushWidgetState { tool_id, state } => Some(json!({
                "type": tags::PUSH_WIDGET_STATE,
                "toolId": tool_id,
                "state": state,
            })),
            HostMessage::Request { .. } | HostMessage::Notification { .. } => None,
        }
    }
}

/// `sendFollowup` carries either a bare string or `{prompt}`
fn followup_text(message: &Value) -> Option<String> {
    match message {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => str_field(obj, "prompt").map(String::from),
        _ => None,
    }
}

/// Map a context diff onto the globals a flat guest reads
fn globals(diff: &ContextDiff) -> Map<String, Value> {
    let mut globals = Map::new();
    if let Some(theme) = diff.theme {
        globals.insert("theme".into(), json!(theme));
    }
    if let Some(mode) = diff.display_mode {
        globals.insert("displayMode".into(), json!(mode));
    }
    if let Some(max_height) = diff.max_height {
        globals.insert("maxHeight".into(), max_height.to_value());
    }
    if let Some(locale) = &diff.locale {
        globals.insert("locale".into(), json!(locale));
    }
    if let Some(insets) = &diff.safe_area_insets {
        globals.insert("safeArea".into(), json!({ "insets": insets }));
    }
    if diff.platform.is_some() || diff.device_capabilities.is_some() {
        let mut user_agent = Map::new();
        if let Some(platform) = diff.platform {
            user_agent.insert("device".into(), json!({ "type": platform }));
        }
        if let Some(caps) = &diff.device_capabilities {
            user_agent.insert("capabilities".into(), json!(caps));
        }
        globals.insert("userAgent".into(), Value::Object(user_agent));
    }
    globals
}
