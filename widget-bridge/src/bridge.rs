//! Widget bridge dispatcher
//!
//! [`WidgetBridge`] owns every live session, the floating slot and the host
//! environment. Guest messages go in through [`WidgetBridge::handle_message`];
//! nothing a guest sends can make it panic or return an error. Work that has
//! to wait (proxied tool calls, geolocation) runs on spawned tasks so one slow
//! widget never stalls the others.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::config::BridgeConfig;
use crate::context::{ContextDiff, Environment};
use crate::display::DisplayModeMachine;
use crate::error::{Error, Result};
use crate::events::{EventSink, HostEvent};
use crate::geo::{GeoCache, GeoLocator};
use crate::pending::PendingReply;
use crate::protocol::{
    methods, Codec, CspViolation, DisplayMode, DisplayModeRequest, DisplayModeResult, GuestCall,
    GuestEvent, GuestNotice, HostContext, HostMessage, InitializeResult, MaxHeight,
    ProtocolVariant, RequestId, ResourceTeardownParams, RpcError, ToolCallRequest,
    ToolCancelledParams, ToolInfo, ToolInputParams,
};
use crate::proxy::{
    ToolCallProxy, ToolExecutor, RESOURCE_READS_NOT_SUPPORTED, TOOL_CALLS_NOT_SUPPORTED,
};
use crate::security::CspViolationRecord;
use crate::session::{deliver, SessionId, SessionSpec, WidgetSession};
use crate::sync::Surface;
use crate::transport::GuestChannel;

/// Everything the event loop reacts to
pub enum BridgeInput {
    /// Raw message posted by a guest surface
    Guest {
        session: SessionId,
        surface: Surface,
        message: Value,
    },
    /// Host environment changed
    Environment(Environment),
    /// Host-initiated display mode change
    DisplayMode {
        session: SessionId,
        request: DisplayModeRequest,
    },
    /// A surface finished loading its markup
    SurfaceLoaded { session: SessionId, surface: Surface },
    /// Open a session for a renderable tool result
    Open {
        spec: SessionSpec,
        channel: Arc<dyn GuestChannel>,
        reply: oneshot::Sender<SessionId>,
    },
    /// A modal surface was created for a session
    AttachSecondary {
        session: SessionId,
        channel: Arc<dyn GuestChannel>,
    },
    Close { session: SessionId },
}

/// Builder for [`WidgetBridge`]
pub struct WidgetBridgeBuilder {
    config: BridgeConfig,
    environment: Environment,
    executor: Option<Arc<dyn ToolExecutor>>,
    locator: Option<Arc<dyn GeoLocator>>,
    geo_cache: &'static GeoCache,
}

impl WidgetBridgeBuilder {
    fn new() -> Self {
        Self {
            config: BridgeConfig::default(),
            environment: Environment::default(),
            executor: None,
            locator: None,
            geo_cache: GeoCache::global(),
        }
    }

    /// Set the bridge configuration
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Initial host environment
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Facility that runs proxied tool calls and resource reads. Without one,
    /// guests are told those calls are not supported.
    pub fn with_executor(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Source for the coarse location offered in the handshake
    pub fn with_geolocation(mut self, locator: Arc<dyn GeoLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Use a cache other than [`GeoCache::global`]
    pub fn with_geo_cache(mut self, cache: &'static GeoCache) -> Self {
        self.geo_cache = cache;
        self
    }

    /// Build the bridge and the receiver of its host events
    pub fn build(self) -> (WidgetBridge, mpsc::UnboundedReceiver<HostEvent>) {
        let (events, rx) = EventSink::channel();
        let proxy = match self.executor {
            Some(executor) => ToolCallProxy::new(executor),
            None => ToolCallProxy::unconfigured(),
        };
        let bridge = WidgetBridge {
            config: self.config,
            environment: self.environment,
            sessions: HashMap::new(),
            display: DisplayModeMachine::new(),
            proxy,
            locator: self.locator,
            geo_cache: self.geo_cache,
            events,
        };
        (bridge, rx)
    }
}

/// Host side of every widget conversation
pub struct WidgetBridge {
    config: BridgeConfig,
    environment: Environment,
    sessions: HashMap<SessionId, WidgetSession>,
    display: DisplayModeMachine,
    proxy: ToolCallProxy,
    locator: Option<Arc<dyn GeoLocator>>,
    geo_cache: &'static GeoCache,
    events: EventSink,
}

impl WidgetBridge {
    /// Create a new bridge builder
    pub fn builder() -> WidgetBridgeBuilder {
        WidgetBridgeBuilder::new()
    }

    /// Get the bridge configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Current host environment
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Look up an open session
    pub fn session(&self, id: SessionId) -> Option<&WidgetSession> {
        self.sessions.get(&id)
    }

    /// Session currently holding the floating slot
    pub fn floating_holder(&self) -> Option<SessionId> {
        self.display.floating_holder()
    }

    // --- lifecycle ---

    /// Start a session for a widget rendered into `primary`
    pub fn open_session(&mut self, spec: SessionSpec, primary: Arc<dyn GuestChannel>) -> SessionId {
        let id = SessionId::new();
        tracing::info!(
            session = %id,
            tool = %spec.tool_name,
            resource = %spec.resource_ref,
            variant = ?spec.variant,
            "opening widget session"
        );
        self.sessions
            .insert(id, WidgetSession::new(id, spec, primary, &self.config));
        self.warm_geolocation();
        id
    }

    /// Drop a session. Outstanding host requests resolve to
    /// [`Error::SessionClosed`]; in-flight tool calls are left to finish.
    pub fn close_session(&mut self, id: SessionId) -> Result<()> {
        let session = self
            .sessions
            .remove(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        self.display.release(id);
        tracing::info!(session = %id, pending = session.pending.len(), "closed widget session");
        Ok(())
    }

    /// Attach a modal surface. It receives widget state once it has loaded.
    pub fn attach_secondary(&mut self, id: SessionId, channel: Arc<dyn GuestChannel>) -> Result<()> {
        self.session_mut(id)?.attach_secondary(channel);
        tracing::debug!(session = %id, "secondary surface attached");
        Ok(())
    }

    /// Remove the modal surface; state stops mirroring to it
    pub fn detach_secondary(&mut self, id: SessionId) -> Result<()> {
        self.session_mut(id)?.detach_secondary();
        Ok(())
    }

    /// A surface finished loading.
    ///
    /// For a flat primary this is the handshake: the full context goes out
    /// in one `set_globals`. JSON-RPC guests handshake with `ui/initialize`
    /// instead. A secondary surface gets the current widget state.
    pub fn surface_loaded(&mut self, id: SessionId, surface: Surface) -> Result<()> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;

        match (surface, session.variant()) {
            (Surface::Primary, ProtocolVariant::Flat) => {
                let snapshot = session.snapshot(&self.environment);
                let globals = HostMessage::ContextChanged(ContextDiff::full(&snapshot));
                session.context.fold_in(snapshot);
                session.send(Surface::Primary, &globals)?;
                self.events.emit(HostEvent::SessionReady { session: id });
            }
            (Surface::Primary, ProtocolVariant::JsonRpc) => {
                tracing::debug!(session = %id, "waiting for ui/initialize");
            }
            (Surface::Secondary, _) => {
                if session.channel(Surface::Secondary).is_none() {
                    return Err(Error::Unsupported("no secondary surface attached".to_string()));
                }
                let push = session.widget_state.secondary_ready();
                session.send(
                    Surface::Secondary,
                    &HostMessage::PushWidgetState {
                        tool_id: push.tool_id,
                        state: push.state,
                    },
                )?;
            }
        }
        Ok(())
    }

    // --- host-initiated ---

    /// Replace the host environment and push diffs to every ready session
    pub fn update_environment(&mut self, environment: Environment) {
        self.environment = environment;
        for session in self.sessions.values_mut() {
            session.sync_context(&self.environment);
        }
    }

    /// Host-initiated presentation change, under the same rules as a guest request
    pub fn set_display_mode(&mut self, id: SessionId, request: DisplayModeRequest) -> Result<DisplayMode> {
        self.apply_display_request(id, request)
    }

    /// Send a request to a JSON-RPC guest. The reply arrives through
    /// [`handle_message`](Self::handle_message) and resolves the returned future.
    pub fn issue_request(
        &mut self,
        id: SessionId,
        method: impl Into<String>,
        params: Value,
    ) -> Result<PendingReply> {
        let session = self.session_mut(id)?;
        if session.variant() != ProtocolVariant::JsonRpc {
            return Err(Error::Unsupported(
                "flat guests cannot receive host requests".to_string(),
            ));
        }

        let (message, reply) = session.pending.issue(method, params)?;
        match session.send(Surface::Primary, &message) {
            Ok(true) => Ok(reply),
            Ok(false) => {
                session.pending.cancel(reply.id());
                Err(Error::Protocol("request has no wire form".to_string()))
            }
            Err(e) => {
                session.pending.cancel(reply.id());
                Err(e)
            }
        }
    }

    /// Ask the guest to clean up before the host removes it
    pub fn request_teardown(&mut self, id: SessionId, reason: Option<String>) -> Result<PendingReply> {
        let params = serde_json::to_value(ResourceTeardownParams { reason })?;
        self.issue_request(id, methods::RESOURCE_TEARDOWN, params)
    }

    /// Tell the guest the tool it renders for was cancelled
    pub fn notify_tool_cancelled(&mut self, id: SessionId, reason: Option<String>) -> Result<()> {
        let params = serde_json::to_value(ToolCancelledParams { reason })?;
        let session = self.session_mut(id)?;
        let sent = session.send(
            Surface::Primary,
            &HostMessage::Notification {
                method: methods::TOOL_CANCELLED.to_string(),
                params,
            },
        )?;
        if !sent {
            tracing::debug!(session = %id, "tool cancellation has no flat form");
        }
        Ok(())
    }

    // --- queries ---

    /// CSP violations recorded for a session, oldest first
    pub fn csp_violations(&self, id: SessionId) -> Result<Vec<CspViolationRecord>> {
        Ok(self.session_ref(id)?.csp.entries().cloned().collect())
    }

    /// Latest widget state set by either surface
    pub fn widget_state(&self, id: SessionId) -> Result<Option<Value>> {
        Ok(self.session_ref(id)?.widget_state.current().cloned())
    }

    /// Current display mode of a session
    pub fn display_mode(&self, id: SessionId) -> Result<DisplayMode> {
        Ok(self.session_ref(id)?.display_mode())
    }

    /// Number of host requests still awaiting a guest reply
    pub fn pending_requests(&self, id: SessionId) -> Result<usize> {
        Ok(self.session_ref(id)?.pending.len())
    }

    // --- guest messages ---

    /// Decode and dispatch one raw guest message. Malformed input is
    /// dropped; failures are logged and never reach the caller.
    pub fn handle_message(&mut self, id: SessionId, surface: Surface, raw: Value) {
        let Some(session) = self.sessions.get(&id) else {
            tracing::debug!(session = %id, "message for unknown session dropped");
            return;
        };
        let Some(event) = session.codec().decode(&raw) else {
            tracing::debug!(session = %id, surface = %surface, "dropping malformed guest message");
            return;
        };

        let result = match event {
            GuestEvent::Request { id: request_id, call } => self.on_request(id, surface, request_id, call),
            GuestEvent::Response { id: request_id, outcome } => {
                self.session_mut(id).map(|session| {
                    session.pending.resolve(&request_id, outcome);
                })
            }
            GuestEvent::Notification(notice) => self.on_notice(id, surface, notice),
            GuestEvent::SecuritySignal(violation) => self.on_csp_violation(id, surface, violation),
        };

        if let Err(e) = result {
            tracing::warn!(session = %id, surface = %surface, error = %e, "failed to handle guest message");
        }
    }

    fn on_request(
        &mut self,
        id: SessionId,
        surface: Surface,
        request_id: RequestId,
        call: GuestCall,
    ) -> Result<()> {
        let outcome = match call {
            GuestCall::Initialize(params) => {
                tracing::debug!(session = %id, client = ?params.client_info, "ui/initialize");
                self.handshake(id, surface)
            }
            GuestCall::CallTool(request) => return self.proxy_tool_call(id, surface, request_id, request),
            GuestCall::ReadResource { uri } => return self.proxy_resource_read(id, surface, request_id, uri),
            GuestCall::OpenLink { url } => match Url::parse(&url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                    self.events.emit(HostEvent::OpenLink { session: id, url });
                    Ok(json!({}))
                }
                Ok(parsed) => Err(RpcError::invalid_params(format!(
                    "unsupported url scheme: {}",
                    parsed.scheme()
                ))),
                Err(e) => Err(RpcError::invalid_params(format!("invalid url: {}", e))),
            },
            GuestCall::Message { role, text } => {
                match text {
                    Some(text) => self.events.emit(HostEvent::FollowupMessage { session: id, role, text }),
                    None => tracing::debug!(session = %id, "ui/message without text content"),
                }
                Ok(json!({}))
            }
            GuestCall::RequestDisplayMode(request) => self
                .apply_display_request(id, request)
                .map_err(|e| RpcError::from(&e))
                .and_then(|mode| {
                    serde_json::to_value(DisplayModeResult { mode })
                        .map_err(|e| RpcError::execution(e.to_string()))
                }),
            GuestCall::UpdateModelContext(context) => {
                self.events.emit(HostEvent::ModelContextUpdated { session: id, context });
                Ok(json!({}))
            }
            GuestCall::Invalid { method, reason } => {
                tracing::debug!(session = %id, method = %method, reason = %reason, "invalid params");
                Err(RpcError::invalid_params(reason))
            }
            GuestCall::Unsupported { method } => {
                tracing::debug!(session = %id, method = %method, "unsupported method");
                Err(RpcError::method_not_found(format!("Method not found: {}", method)))
            }
        };

        self.reply(id, surface, request_id, outcome)
    }

    fn reply(
        &self,
        id: SessionId,
        surface: Surface,
        request_id: RequestId,
        outcome: std::result::Result<Value, RpcError>,
    ) -> Result<()> {
        self.session_ref(id)?.send(
            surface,
            &HostMessage::Reply {
                id: request_id,
                outcome,
            },
        )?;
        Ok(())
    }

    /// Build the `ui/initialize` reply and fold the handshake snapshot in
    fn handshake(&mut self, id: SessionId, surface: Surface) -> std::result::Result<Value, RpcError> {
        let user_location = self.geo_cache.cached().cloned();
        let mut host_capabilities = json!({ "openLinks": {}, "logging": {} });
        if self.proxy.is_configured() {
            host_capabilities["serverTools"] = json!({});
            host_capabilities["serverResources"] = json!({});
        }

        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| RpcError::execution("session closed"))?;
        let snapshot = session.snapshot(&self.environment);
        let host_context = HostContext::new(
            &snapshot,
            ToolInfo {
                name: session.spec().tool_name.clone(),
                resource_uri: session.spec().resource_ref.clone(),
            },
            self.config.available_display_modes.clone(),
            user_location,
        );

        // Only the primary surface's context is tracked for diffs
        if surface == Surface::Primary {
            let first = !session.is_ready();
            session.context.fold_in(snapshot);
            if first {
                self.events.emit(HostEvent::SessionReady { session: id });
            }
        }

        serde_json::to_value(InitializeResult {
            protocol_version: self.config.protocol_version.clone(),
            host_capabilities,
            host_info: self.config.host_info.clone(),
            host_context,
        })
        .map_err(|e| RpcError::execution(e.to_string()))
    }

    fn proxy_tool_call(
        &mut self,
        id: SessionId,
        surface: Surface,
        request_id: RequestId,
        request: ToolCallRequest,
    ) -> Result<()> {
        if !self.proxy.is_configured() {
            return self.reply(
                id,
                surface,
                request_id,
                Err(RpcError::method_not_found(TOOL_CALLS_NOT_SUPPORTED)),
            );
        }

        let session = self.session_ref(id)?;
        let channel = session
            .channel(surface)
            .cloned()
            .ok_or_else(|| Error::Transport(format!("{} surface is gone", surface)))?;
        let codec = session.codec();
        let proxy = self.proxy.clone();
        let events = self.events.clone();

        tracing::debug!(session = %id, tool = %request.name, "proxying tool call");
        tokio::spawn(async move {
            let tool_name = request.name.clone();
            let outcome = proxy.call_tool(request).await;
            if let Some(challenge) = outcome.challenge {
                events.emit(HostEvent::AuthChallenge {
                    session: id,
                    tool_name,
                    challenge,
                });
            }
            post_reply(codec, channel.as_ref(), id, request_id, outcome.result);
        });
        Ok(())
    }

    fn proxy_resource_read(
        &mut self,
        id: SessionId,
        surface: Surface,
        request_id: RequestId,
        uri: String,
    ) -> Result<()> {
        if !self.proxy.is_configured() {
            return self.reply(
                id,
                surface,
                request_id,
                Err(RpcError::method_not_found(RESOURCE_READS_NOT_SUPPORTED)),
            );
        }

        let session = self.session_ref(id)?;
        let channel = session
            .channel(surface)
            .cloned()
            .ok_or_else(|| Error::Transport(format!("{} surface is gone", surface)))?;
        let codec = session.codec();
        let proxy = self.proxy.clone();

        tokio::spawn(async move {
            let outcome = proxy.read_resource(&uri).await;
            post_reply(codec, channel.as_ref(), id, request_id, outcome.result);
        });
        Ok(())
    }

    fn on_notice(&mut self, id: SessionId, surface: Surface, notice: GuestNotice) -> Result<()> {
        match notice {
            GuestNotice::Initialized => self.deliver_tool_data(id),
            GuestNotice::Resized { height } => {
                self.events.emit(HostEvent::Resized { session: id, height });
                Ok(())
            }
            GuestNotice::Log { level, data } => {
                self.events.emit(HostEvent::GuestLog { session: id, level, data });
                Ok(())
            }
            GuestNotice::SetWidgetState { tool_id, state } => self.on_widget_state(id, surface, tool_id, state),
            GuestNotice::Followup { message } => {
                self.events.emit(HostEvent::FollowupMessage {
                    session: id,
                    role: "user".to_string(),
                    text: message,
                });
                Ok(())
            }
            GuestNotice::RequestDisplayMode(request) => self.apply_display_request(id, request).map(|_| ()),
            GuestNotice::RequestClose => {
                self.events.emit(HostEvent::RequestClose { session: id });
                Ok(())
            }
            GuestNotice::OpenExternal { href } => {
                if is_local_address(&href) {
                    tracing::debug!(session = %id, href = %href, "suppressing link to local address");
                } else {
                    self.events.emit(HostEvent::OpenLink { session: id, url: href });
                }
                Ok(())
            }
            GuestNotice::RequestModal { title, params } => {
                self.events.emit(HostEvent::RequestModal { session: id, title, params });
                Ok(())
            }
        }
    }

    /// Send the tool's input and, if present, its result
    fn deliver_tool_data(&mut self, id: SessionId) -> Result<()> {
        let session = self.session_ref(id)?;
        let spec = session.spec();

        let input = serde_json::to_value(ToolInputParams {
            arguments: spec.tool_input.clone(),
        })?;
        session.send(
            Surface::Primary,
            &HostMessage::Notification {
                method: methods::TOOL_INPUT.to_string(),
                params: input,
            },
        )?;

        if let Some(output) = &spec.tool_output {
            session.send(
                Surface::Primary,
                &HostMessage::Notification {
                    method: methods::TOOL_RESULT.to_string(),
                    params: output.clone(),
                },
            )?;
        }
        Ok(())
    }

    fn on_widget_state(
        &mut self,
        id: SessionId,
        surface: Surface,
        tool_id: Option<String>,
        state: Value,
    ) -> Result<()> {
        let session = self.session_mut(id)?;
        let Some(change) = session.widget_state.apply(surface, tool_id, state) else {
            return Ok(());
        };

        if let Some(target) = change.mirror_to {
            session.send(
                target,
                &HostMessage::PushWidgetState {
                    tool_id: change.tool_id.clone(),
                    state: change.state.clone(),
                },
            )?;
        }

        self.events.emit(HostEvent::WidgetStateChanged {
            session: id,
            tool_id: change.tool_id,
            state: change.state,
        });
        Ok(())
    }

    fn on_csp_violation(&mut self, id: SessionId, surface: Surface, violation: CspViolation) -> Result<()> {
        let session = self.session_mut(id)?;
        tracing::debug!(
            session = %id,
            directive = %violation.directive,
            blocked = ?violation.blocked_uri,
            "csp violation"
        );
        let record = session.csp.record(surface, violation).clone();
        self.events.emit(HostEvent::CspViolation { session: id, record });
        Ok(())
    }

    // --- display mode ---

    fn apply_display_request(&mut self, id: SessionId, request: DisplayModeRequest) -> Result<DisplayMode> {
        let narrow = self.environment.is_narrow(self.config.narrow_viewport_width);
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;

        let transition = self
            .display
            .transition(id, session.display_mode, &request, narrow);
        session.display_mode = transition.mode;
        session.max_height = transition.max_height;
        session.sync_context(&self.environment);
        self.events.emit(HostEvent::DisplayModeChanged {
            session: id,
            mode: transition.mode,
            max_height: transition.max_height,
        });

        if let Some(evicted) = transition.evicted {
            if let Some(other) = self.sessions.get_mut(&evicted) {
                other.display_mode = DisplayMode::Inline;
                other.max_height = MaxHeight::Default;
                other.sync_context(&self.environment);
                self.events.emit(HostEvent::DisplayModeChanged {
                    session: evicted,
                    mode: DisplayMode::Inline,
                    max_height: MaxHeight::Default,
                });
            }
        }

        Ok(transition.mode)
    }

    // --- event loop ---

    /// Run until every input sender is dropped
    pub async fn run(mut self, mut inputs: mpsc::Receiver<BridgeInput>) {
        tracing::info!("widget bridge running");
        while let Some(input) = inputs.recv().await {
            self.dispatch(input);
        }
        tracing::info!(sessions = self.sessions.len(), "widget bridge stopped");
    }

    fn dispatch(&mut self, input: BridgeInput) {
        let result = match input {
            BridgeInput::Guest {
                session,
                surface,
                message,
            } => {
                self.handle_message(session, surface, message);
                Ok(())
            }
            BridgeInput::Environment(environment) => {
                self.update_environment(environment);
                Ok(())
            }
            BridgeInput::DisplayMode { session, request } => self.set_display_mode(session, request).map(|_| ()),
            BridgeInput::SurfaceLoaded { session, surface } => self.surface_loaded(session, surface),
            BridgeInput::Open { spec, channel, reply } => {
                let id = self.open_session(spec, channel);
                if reply.send(id).is_err() {
                    tracing::debug!(session = %id, "open requester went away");
                }
                Ok(())
            }
            BridgeInput::AttachSecondary { session, channel } => self.attach_secondary(session, channel),
            BridgeInput::Close { session } => self.close_session(session),
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "bridge input failed");
        }
    }

    // --- helpers ---

    fn session_ref(&self, id: SessionId) -> Result<&WidgetSession> {
        self.sessions
            .get(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut WidgetSession> {
        self.sessions
            .get_mut(&id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Kick off a background lookup unless the location is already known
    fn warm_geolocation(&self) {
        let Some(locator) = self.locator.clone() else {
            return;
        };
        if self.geo_cache.cached().is_some() {
            return;
        }
        let cache = self.geo_cache;
        tokio::spawn(async move {
            if cache.resolve(locator.as_ref()).await.is_ok() {
                tracing::debug!("geolocation cached");
            }
        });
    }
}

fn post_reply(
    codec: &dyn Codec,
    channel: &dyn GuestChannel,
    session: SessionId,
    request_id: RequestId,
    outcome: std::result::Result<Value, RpcError>,
) {
    let message = HostMessage::Reply {
        id: request_id,
        outcome,
    };
    if let Err(e) = deliver(codec, channel, &message) {
        tracing::warn!(session = %session, error = %e, "failed to deliver proxied reply");
    }
}

/// `http://localhost*` and `http://127.0.0.1*`
fn is_local_address(href: &str) -> bool {
    ["http://localhost", "http://127.0.0.1"].iter().any(|prefix| {
        href.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_address_detection() {
        assert!(is_local_address("http://localhost:3000/callback"));
        assert!(is_local_address("http://127.0.0.1/"));
        assert!(!is_local_address("https://localhost:3000"));
        assert!(!is_local_address("https://example.com"));
        assert!(is_local_address("http://localhost.evil.example/x"));
        assert!(is_local_address("HTTP://LOCALHOST:8080"));
        assert!(!is_local_address("not a url"));
    }
}
