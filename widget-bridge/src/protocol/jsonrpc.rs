//! JSON-RPC 2.0 protocol of the MCP Apps extension

use serde_json::{json, Map, Value};

use super::messages::methods;
use super::types::{f64_field, str_field, JSONRPC_VERSION};
use super::{
    Codec, CspViolation, DisplayMode, DisplayModeRequest, GuestCall, GuestEvent, GuestNotice,
    HostMessage, InitializeParams, MaxHeight, RequestId, RpcError, ToolCallRequest,
};

/// `type` tag of CSP reports, which sandboxes post outside the JSON-RPC envelope
pub const CSP_REPORT_TYPE: &str = "mcp-apps:csp-violation";

/// Codec for JSON-RPC 2.0 guests
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRpcCodec;

impl Codec for JsonRpcCodec {
    fn decode(&self, raw: &Value) -> Option<GuestEvent> {
        let obj = raw.as_object()?;

        if str_field(obj, "type") == Some(CSP_REPORT_TYPE) {
            return CspViolation::from_report(obj).map(GuestEvent::SecuritySignal);
        }
        if str_field(obj, "jsonrpc") != Some(JSONRPC_VERSION) {
            return None;
        }

        let id = match obj.get("id") {
            Some(value) => Some(RequestId::from_value(value)?),
            None => None,
        };
        let params = obj.get("params").and_then(Value::as_object);

        match (str_field(obj, "method"), id) {
            (Some(method), Some(id)) => Some(GuestEvent::Request {
                id,
                call: decode_call(method, obj.get("params"), params),
            }),
            (Some(method), None) => decode_notice(method, params).map(GuestEvent::Notification),
            (None, Some(id)) => decode_response(obj).map(|outcome| GuestEvent::Response { id, outcome }),
            (None, None) => None,
        }
    }

    fn encode(&self, message: &HostMessage) -> Option<Value> {
        match message {
            HostMessage::Reply { id, outcome } => Some(match outcome {
                Ok(result) => json!({
                    "jsonrpc": JSONRPC_VERSION,
                    "id": id.to_value(),
                    "result": result,
                }),
                Err(error) => json!({
                    "jsonrpc": JSONRPC_VERSION,
                    "id": id.to_value(),
                    "error": error,
                }),
            }),
            HostMessage::Request { id, method, params } => Some(json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": id.to_value(),
                "method": method,
                "params": params,
            })),
            HostMessage::Notification { method, params } => Some(notification(method, params.clone())),
            HostMessage::ContextChanged(diff) => {
                if diff.is_empty() {
                    return None;
                }
                let params = serde_json::to_value(diff).ok()?;
                Some(notification(methods::HOST_CONTEXT_CHANGED, params))
            }
            HostMessage::PushWidgetState { .. } => None,
        }
    }
}

fn notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": method,
        "params": params,
    })
}

fn decode_call(method: &str, raw_params: Option<&Value>, params: Option<&Map<String, Value>>) -> GuestCall {
    let invalid = |reason: &str| GuestCall::Invalid {
        method: method.to_string(),
        reason: reason.to_string(),
    };

    match method {
        methods::INITIALIZE => GuestCall::Initialize(
            raw_params
                .and_then(|p| serde_json::from_value::<InitializeParams>(p.clone()).ok())
                .unwrap_or_default(),
        ),
        methods::TOOLS_CALL => {
            let Some(params) = params else {
                return invalid("missing params");
            };
            let Some(name) = str_field(params, "name") else {
                return invalid("missing tool name");
            };
            let arguments = match params.get("arguments") {
                None | Some(Value::Null) => Value::Object(Map::new()),
                Some(args @ Value::Object(_)) => args.clone(),
                Some(_) => return invalid("arguments must be an object"),
            };
            GuestCall::CallTool(ToolCallRequest {
                name: name.to_string(),
                arguments,
                meta: params.get("_meta").filter(|m| !m.is_null()).cloned(),
            })
        }
        methods::RESOURCES_READ => match params.and_then(|p| str_field(p, "uri")) {
            Some(uri) => GuestCall::ReadResource { uri: uri.to_string() },
            None => invalid("missing uri"),
        },
        methods::OPEN_LINK => match params.and_then(|p| str_field(p, "url")) {
            Some(url) => GuestCall::OpenLink { url: url.to_string() },
            None => invalid("missing url"),
        },
        methods::MESSAGE => {
            let Some(params) = params else {
                return invalid("missing params");
            };
            GuestCall::Message {
                role: str_field(params, "role").unwrap_or("user").to_string(),
                text: params.get("content").and_then(first_text),
            }
        }
        methods::REQUEST_DISPLAY_MODE => {
            let Some(params) = params else {
                return invalid("missing params");
            };
            let Some(mode) = str_field(params, "mode").and_then(DisplayMode::parse) else {
                return invalid("unknown display mode");
            };
            let Some(max_height) = MaxHeight::from_field(params, "maxHeight") else {
                return invalid("maxHeight must be a number or null");
            };
            GuestCall::RequestDisplayMode(DisplayModeRequest::new(mode).with_max_height(max_height))
        }
        methods::UPDATE_MODEL_CONTEXT => {
            GuestCall::UpdateModelContext(raw_params.cloned().unwrap_or(Value::Null))
        }
        other => GuestCall::Unsupported {
            method: other.to_string(),
        },
    }
}

fn decode_notice(method: &str, params: Option<&Map<String, Value>>) -> Option<GuestNotice> {
    match method {
        methods::INITIALIZED => Some(GuestNotice::Initialized),
        methods::SIZE_CHANGED | methods::SIZE_CHANGE_LEGACY => Some(GuestNotice::Resized {
            height: f64_field(params?, "height")?,
        }),
        methods::LOG_MESSAGE => {
            let params = params?;
            Some(GuestNotice::Log {
                level: str_field(params, "level").map(String::from),
                data: params.get("data").cloned().unwrap_or(Value::Null),
            })
        }
        _ => None,
    }
}

fn decode_response(obj: &Map<String, Value>) -> Option<Result<Value, RpcError>> {
    if let Some(error) = obj.get("error") {
        let error = serde_json::from_value::<RpcError>(error.clone()).ok()?;
        return Some(Err(error));
    }
    obj.get("result").cloned().map(Ok)
}

/// Text of the first `{type: "text"}` block; `content` may be one block or an array
fn first_text(content: &Value) -> Option<String> {
    let text_of = |block: &Value| {
        let block = block.as_object()?;
        (str_field(block, "type") == Some("text"))
            .then(|| str_field(block, "text").map(String::from))
            .flatten()
    };
    match content {
        Value::Array(blocks) => blocks.iter().find_map(text_of),
        Value::Object(_) => text_of(content),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
