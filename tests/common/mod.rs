use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use mucinvite::connection::{Connection, ConnectionId, MessageListener, SendError};
use mucinvite::stanza::message::Message;
use tokio::sync::Notify;

/// In-memory connection double: records outbound stanzas and lets tests
/// inject inbound ones, from any thread.
pub struct DummyConnection {
    id: ConnectionId,
    authenticated: AtomicBool,
    listeners: Mutex<Vec<MessageListener>>,
    sent: Mutex<Vec<Message>>,
    sent_notify: Notify,
}

impl DummyConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(DummyConnection {
            id: ConnectionId::new(),
            authenticated: AtomicBool::new(true),
            listeners: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            sent_notify: Notify::new(),
        })
    }

    /// Hands an inbound stanza to every registered listener, synchronously,
    /// the way a real connection's delivery thread would.
    pub fn deliver(&self, message: &Message) {
        let listeners = self.listeners.lock().unwrap().clone();
        for listener in listeners {
            listener(message);
        }
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::Relaxed);
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }

    /// Waits for the next stanza to go out on the wire. Wrap in
    /// `tokio::time::timeout` for a bounded wait.
    pub async fn next_sent(&self) -> Message {
        loop {
            {
                let mut sent = self.sent.lock().unwrap();
                if !sent.is_empty() {
                    return sent.remove(0);
                }
            }
            self.sent_notify.notified().await;
        }
    }
}

impl Connection for DummyConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send_message(&self, message: &Message) -> Result<(), SendError> {
        if !self.authenticated.load(Ordering::Relaxed) {
            return Err(SendError::NotAuthenticated);
        }
        self.sent.lock().unwrap().push(message.clone());
        self.sent_notify.notify_one();
        Ok(())
    }

    fn add_message_listener(&self, listener: MessageListener) {
        self.listeners.lock().unwrap().push(listener);
    }
}
