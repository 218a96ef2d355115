//! Per-widget session state

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::BridgeConfig;
use crate::context::{ContextDiff, ContextStore, Environment, HostContextSnapshot};
use crate::error::Result;
use crate::pending::PendingRequests;
use crate::protocol::{Codec, DisplayMode, HostMessage, MaxHeight, ProtocolVariant};
use crate::security::CspViolationLog;
use crate::sync::{Surface, WidgetStateSync};
use crate::transport::GuestChannel;

/// Identifies one live widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the host knows about a widget when it opens a session for it
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSpec {
    pub variant: ProtocolVariant,
    /// Tool whose result designated the widget
    pub tool_name: String,
    /// UI resource the widget markup came from
    pub resource_ref: String,
    /// Arguments the tool was called with
    pub tool_input: Value,
    /// The tool result, if it has arrived
    pub tool_output: Option<Value>,
}

impl SessionSpec {
    pub fn new(
        variant: ProtocolVariant,
        tool_name: impl Into<String>,
        resource_ref: impl Into<String>,
    ) -> Self {
        Self {
            variant,
            tool_name: tool_name.into(),
            resource_ref: resource_ref.into(),
            tool_input: Value::Object(Default::default()),
            tool_output: None,
        }
    }

    /// Arguments the tool was invoked with
    pub fn with_tool_input(mut self, input: Value) -> Self {
        self.tool_input = input;
        self
    }

    /// Result the tool returned
    pub fn with_tool_output(mut self, output: Value) -> Self {
        self.tool_output = Some(output);
        self
    }
}

/// One live guest instance, owned by the bridge
pub struct WidgetSession {
    id: SessionId,
    spec: SessionSpec,
    pub(crate) display_mode: DisplayMode,
    pub(crate) max_height: MaxHeight,
    pub(crate) context: ContextStore,
    pub(crate) widget_state: WidgetStateSync,
    pub(crate) pending: PendingRequests,
    pub(crate) csp: CspViolationLog,
    primary: Arc<dyn GuestChannel>,
    secondary: Option<Arc<dyn GuestChannel>>,
}

impl WidgetSession {
    pub(crate) fn new(
        id: SessionId,
        spec: SessionSpec,
        primary: Arc<dyn GuestChannel>,
        config: &BridgeConfig,
    ) -> Self {
        Self {
            id,
            spec,
            display_mode: DisplayMode::Inline,
            max_height: MaxHeight::Default,
            context: ContextStore::new(),
            widget_state: WidgetStateSync::new(),
            pending: PendingRequests::new(config.request_timeout, config.max_pending_requests),
            csp: CspViolationLog::new(config.csp_log_capacity),
            primary,
            secondary: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn spec(&self) -> &SessionSpec {
        &self.spec
    }

    /// Wire protocol the guest speaks
    pub fn variant(&self) -> ProtocolVariant {
        self.spec.variant
    }

    pub fn codec(&self) -> &'static dyn Codec {
        self.spec.variant.codec()
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn is_ready(&self) -> bool {
        self.context.is_ready()
    }

    pub(crate) fn channel(&self, surface: Surface) -> Option<&Arc<dyn GuestChannel>> {
        match surface {
            Surface::Primary => Some(&self.primary),
            Surface::Secondary => self.secondary.as_ref(),
        }
    }

    pub(crate) fn attach_secondary(&mut self, channel: Arc<dyn GuestChannel>) {
        self.secondary = Some(channel);
        self.widget_state.secondary_detached();
    }

    pub(crate) fn detach_secondary(&mut self) {
        self.secondary = None;
        self.widget_state.secondary_detached();
    }

    /// This session's view of `env` right now
    pub(crate) fn snapshot(&self, env: &Environment) -> HostContextSnapshot {
        HostContextSnapshot::compose(env, self.display_mode, self.max_height)
    }

    /// Encode and post to one surface. `Ok(false)` when the surface is
    /// missing or the protocol has no wire form for the message.
    pub(crate) fn send(&self, surface: Surface, message: &HostMessage) -> Result<bool> {
        match self.channel(surface) {
            Some(channel) => deliver(self.codec(), channel.as_ref(), message),
            None => Ok(false),
        }
    }

    /// Push whatever changed in the context since the last snapshot
    pub(crate) fn sync_context(&mut self, env: &Environment) -> Option<ContextDiff> {
        let diff = self.context.observe(self.snapshot(env))?;
        if let Err(e) = self.send(Surface::Primary, &HostMessage::ContextChanged(diff.clone())) {
            tracing::warn!(session = %self.id, error = %e, "failed to push context change");
        }
        Some(diff)
    }
}

impl std::fmt::Debug for WidgetSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetSession")
            .field("id", &self.id)
            .field("variant", &self.spec.variant)
            .field("tool_name", &self.spec.tool_name)
            .field("display_mode", &self.display_mode)
            .field("ready", &self.is_ready())
            .field("pending", &self.pending)
            .field("secondary", &self.secondary.is_some())
            .finish()
    }
}

/// Encode `message` with `codec` and post it
pub(crate) fn deliver(codec: &dyn Codec, channel: &dyn GuestChannel, message: &HostMessage) -> Result<bool> {
    match codec.encode(message) {
        Some(raw) => channel.post(raw).map(|()| true),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Theme;
    use crate::transport::ChannelPort;
    use serde_json::json;

    fn session(variant: ProtocolVariant) -> (WidgetSession, tokio::sync::mpsc::UnboundedReceiver<Value>) {
        let (port, rx) = ChannelPort::pair();
        let spec = SessionSpec::new(variant, "lookup", "ui://widget/lookup.html");
        (
            WidgetSession::new(SessionId::new(), spec, Arc::new(port), &BridgeConfig::default()),
            rx,
        )
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_no_context_push_before_ready() {
        let (mut session, mut rx) = session(ProtocolVariant::JsonRpc);
        let env = Environment::default().with_theme(Theme::Dark);
        assert!(session.sync_context(&env).is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_context_push_uses_session_codec() {
        let (mut session, mut rx) = session(ProtocolVariant::Flat);
        let env = Environment::default();
        session.context.fold_in(session.snapshot(&env));

        session.sync_context(&env.clone().with_theme(Theme::Dark)).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            json!({"type": "openai:set_globals", "globals": {"theme": "dark"}})
        );
    }

    #[test]
    fn test_send_without_secondary_is_noop() {
        let (session, _rx) = session(ProtocolVariant::Flat);
        let sent = session
            .send(
                Surface::Secondary,
                &HostMessage::PushWidgetState {
                    tool_id: None,
                    state: Value::Null,
                },
            )
            .unwrap();
        assert!(!sent);
    }
}
