use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::stanza::message::Message;

/// Process-unique identity of one connection, used to key per-connection
/// state such as the invitation manager cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        ConnectionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("connection is not authenticated")]
    NotAuthenticated,
    #[error("connection is closed")]
    Closed,
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

/// Callback invoked for every inbound message stanza the connection delivers.
pub type MessageListener = Arc<dyn Fn(&Message) + Send + Sync>;

/// Transport-facing surface of an XMPP connection, as this crate sees it.
///
/// Serialization, authentication and transport retries all live behind this
/// trait. Inbound stanzas are handed to every registered listener on the
/// connection's own delivery thread; [`send_message`](Connection::send_message)
/// is a single blocking send with no buffering on our side.
pub trait Connection: Send + Sync + 'static {
    fn id(&self) -> ConnectionId;

    /// Submits a stanza for delivery. Fails when the transport is down or the
    /// connection has not authenticated yet; no retry is attempted here.
    fn send_message(&self, message: &Message) -> Result<(), SendError>;

    /// Registers a listener for inbound message stanzas. Listeners stay
    /// attached for the life of the connection.
    fn add_message_listener(&self, listener: MessageListener);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ids_are_unique() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
    }
}
