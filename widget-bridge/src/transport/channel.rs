//! Message channel adapter for guest surfaces

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Outbound half of an isolated guest surface.
///
/// Implementations wrap whatever the isolation primitive offers for posting a
/// structured message (`postMessage`, a webview IPC call, a test queue).
/// Posting must not block; the bridge calls it from its event loop.
pub trait GuestChannel: Send + Sync {
    /// Post one message to the guest
    fn post(&self, message: Value) -> Result<()>;
}

/// In-process channel to a guest surface backed by an unbounded tokio queue.
///
/// The receiving half is handed to whatever actually delivers messages into
/// the isolated surface.
#[derive(Debug, Clone)]
pub struct ChannelPort {
    tx: mpsc::UnboundedSender<Value>,
}

impl ChannelPort {
    /// Create a port and the receiver the surface host drains
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Whether the receiving side has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl GuestChannel for ChannelPort {
    fn post(&self, message: Value) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| Error::Transport("guest surface channel closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_delivers_in_order() {
        let (port, mut rx) = ChannelPort::pair();
        port.post(json!({"n": 1})).unwrap();
        port.post(json!({"n": 2})).unwrap();
        assert_eq!(rx.try_recv().unwrap(), json!({"n": 1}));
        assert_eq!(rx.try_recv().unwrap(), json!({"n": 2}));
    }

    #[test]
    fn test_post_after_close_is_transport_error() {
        let (port, rx) = ChannelPort::pair();
        drop(rx);
        assert!(port.is_closed());
        let err = port.post(json!({})).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
