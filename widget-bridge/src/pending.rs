//! Pending request table
//!
//! Correlates host -> guest requests with the guest's replies. Replies may
//! arrive in any order, late, twice, or never; only the id decides where a
//! reply goes, and a reply nobody is waiting for is dropped.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::protocol::{HostMessage, RequestId, RpcError};

struct PendingEntry {
    method: String,
    issued_at: Instant,
    deadline: Instant,
    reply: oneshot::Sender<std::result::Result<Value, RpcError>>,
}

impl PendingEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.deadline && !self.reply.is_closed()
    }
}

/// Outstanding host -> guest requests of one session
pub struct PendingRequests {
    next_id: i64,
    entries: HashMap<RequestId, PendingEntry>,
    timeout: Duration,
    capacity: usize,
}

impl PendingRequests {
    pub fn new(timeout: Duration, capacity: usize) -> Self {
        Self {
            next_id: 1,
            entries: HashMap::new(),
            timeout,
            capacity,
        }
    }

    /// Register a request and build the message that carries it.
    ///
    /// The caller sends the returned message; if sending fails it must
    /// [`cancel`](Self::cancel) the id.
    pub fn issue(&mut self, method: impl Into<String>, params: Value) -> Result<(HostMessage, PendingReply)> {
        self.prune();
        if self.entries.len() >= self.capacity {
            return Err(Error::PendingLimit(self.capacity));
        }

        let id = RequestId::Number(self.next_id);
        self.next_id += 1;
        let method = method.into();

        let issued_at = Instant::now();
        let deadline = issued_at + self.timeout;
        let (tx, rx) = oneshot::channel();
        self.entries.insert(
            id.clone(),
            PendingEntry {
                method: method.clone(),
                issued_at,
                deadline,
                reply: tx,
            },
        );

        let reply = PendingReply::new(id.clone(), rx, deadline);
        Ok((HostMessage::Request { id, method, params }, reply))
    }

    /// Deliver a guest reply. Returns `false` when nothing was waiting on `id`.
    pub fn resolve(&mut self, id: &RequestId, outcome: std::result::Result<Value, RpcError>) -> bool {
        let Some(entry) = self.entries.remove(id) else {
            tracing::debug!(id = %id, "dropping reply with no pending request");
            return false;
        };
        if !entry.is_live(Instant::now()) {
            tracing::debug!(id = %id, method = %entry.method, "dropping reply past its deadline");
            return false;
        }
        tracing::debug!(
            id = %id,
            method = %entry.method,
            elapsed_ms = entry.issued_at.elapsed().as_millis() as u64,
            "resolving pending request"
        );
        entry.reply.send(outcome).is_ok()
    }

    /// Forget a request whose message never left
    pub fn cancel(&mut self, id: &RequestId) {
        self.entries.remove(id);
    }

    /// Number of requests still waiting for a reply
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.values().filter(|entry| entry.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries that expired or whose waiter is gone
    fn prune(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));
    }
}

impl std::fmt::Debug for PendingRequests {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequests")
            .field("next_id", &self.next_id)
            .field("pending", &self.entries.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Future of one guest reply.
///
/// Resolves to the guest's result, [`Error::Remote`] for an error reply,
/// [`Error::Timeout`] once the deadline set at issue time passes, or [`Error::SessionClosed`]
/// when the session went away first. Dropping it abandons the request.
pub struct PendingReply {
    id: RequestId,
    inner: BoxFuture<'static, Result<Value>>,
}

impl PendingReply {
    fn new(
        id: RequestId,
        rx: oneshot::Receiver<std::result::Result<Value, RpcError>>,
        deadline: Instant,
    ) -> Self {
        let label = id.to_string();
        let inner = async move {
            match tokio::time::timeout_at(deadline, rx).await {
                Ok(Ok(outcome)) => outcome.map_err(Error::from),
                // The table drops expired entries, which closes the channel
                Ok(Err(_)) if Instant::now() >= deadline => Err(Error::Timeout(label)),
                Ok(Err(_)) => Err(Error::SessionClosed),
                Err(_) => Err(Error::Timeout(label)),
            }
        }
        .boxed();
        Self { id, inner }
    }

    /// Id the request went out with
    pub fn id(&self) -> &RequestId {
        &self.id
    }
}

impl Future for PendingReply {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl std::fmt::Debug for PendingReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingReply").field("id", &self.id).finish()
    }
}
