//! Developer-facing signals raised by guests
//!
//! These never go back to a guest. The host drains them from the receiver
//! returned by [`WidgetBridgeBuilder::build`](crate::WidgetBridgeBuilder::build).

use serde_json::Value;
use tokio::sync::mpsc;

use crate::protocol::{DisplayMode, MaxHeight};
use crate::proxy::OAuthChallenge;
use crate::security::CspViolationRecord;
use crate::session::SessionId;

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Handshake completed; context diffs flow from now on
    SessionReady { session: SessionId },
    /// A proxied tool result carried a bearer challenge. The result itself
    /// was still delivered to the guest.
    AuthChallenge {
        session: SessionId,
        tool_name: String,
        challenge: OAuthChallenge,
    },
    /// Guest wants a message added to the conversation
    FollowupMessage {
        session: SessionId,
        role: String,
        text: String,
    },
    OpenLink { session: SessionId, url: String },
    RequestClose { session: SessionId },
    RequestModal {
        session: SessionId,
        title: Option<String>,
        params: Value,
    },
    Resized { session: SessionId, height: f64 },
    GuestLog {
        session: SessionId,
        level: Option<String>,
        data: Value,
    },
    WidgetStateChanged {
        session: SessionId,
        tool_id: Option<String>,
        state: Value,
    },
    ModelContextUpdated { session: SessionId, context: Value },
    DisplayModeChanged {
        session: SessionId,
        mode: DisplayMode,
        max_height: MaxHeight,
    },
    CspViolation {
        session: SessionId,
        record: CspViolationRecord,
    },
}

impl HostEvent {
    pub fn session(&self) -> SessionId {
        match self {
            HostEvent::SessionReady { session }
            | HostEvent::AuthChallenge { session, .. }
            | HostEvent::FollowupMessage { session, .. }
            | HostEvent::OpenLink { session, .. }
            | HostEvent::RequestClose { session }
            | HostEvent::RequestModal { session, .. }
            | HostEvent::Resized { session, .. }
            | HostEvent::GuestLog { session, .. }
            | HostEvent::WidgetStateChanged { session, .. }
            | HostEvent::ModelContextUpdated { session, .. }
            | HostEvent::DisplayModeChanged { session, .. }
            | HostEvent::CspViolation { session, .. } => *session,
        }
    }
}

/// Sending half of the host event stream. A dropped receiver just means
/// nobody is listening.
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl EventSink {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub(crate) fn emit(&self, event: HostEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("host event receiver dropped");
        }
    }
}
