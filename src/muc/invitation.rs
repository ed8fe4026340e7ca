use std::sync::{Arc, Mutex, PoisonError};

use jid::Jid;

use super::multi_user_chat::MultiUserChat;
use crate::connection::Connection;
use crate::stanza::message::Message;
use crate::stanza::muc_user::Invite;

/// One decoded invitation, borrowed for the duration of a single listener
/// callback.
///
/// `invite` carries the raw mediated invite element for mediated invitations;
/// it is reserved as `None` for any future direct-dispatch path.
pub struct Invitation<'a, C: Connection> {
    pub connection: &'a C,
    pub room: &'a Arc<MultiUserChat<C>>,
    pub inviter: &'a Jid,
    pub reason: Option<&'a str>,
    pub password: Option<&'a str>,
    pub message: &'a Message,
    pub invite: Option<&'a Invite>,
}

impl<C: Connection> Clone for Invitation<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Connection> Copy for Invitation<'_, C> {}

/// Receives invitations decoded by the
/// [`InvitationManager`](super::invitation_manager::InvitationManager).
///
/// Callbacks run synchronously on the connection's delivery thread; listeners
/// that need to do slow work should hand off to their own executor.
pub trait InvitationListener<C: Connection>: Send + Sync {
    fn invitation_received(&self, invitation: Invitation<'_, C>);
}

impl<C, F> InvitationListener<C> for F
where
    C: Connection,
    F: for<'a> Fn(Invitation<'a, C>) + Send + Sync,
{
    fn invitation_received(&self, invitation: Invitation<'_, C>) {
        self(invitation)
    }
}

/// Wraps a closure as a shareable [`InvitationListener`].
///
/// Registration is keyed on the returned `Arc`, so keep a clone around if the
/// listener should be removable later.
pub fn listener_fn<C, F>(f: F) -> Arc<dyn InvitationListener<C>>
where
    C: Connection,
    F: for<'a> Fn(Invitation<'a, C>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered collection of invitation listeners for one connection.
///
/// Listeners are keyed by `Arc` identity, not content: adding the same `Arc`
/// twice is allowed and yields two deliveries per invitation. Dispatch runs
/// over a snapshot, so concurrent add/remove never perturbs a pass already in
/// flight.
pub(crate) struct InvitationListenerRegistry<C: Connection> {
    listeners: Mutex<Vec<Arc<dyn InvitationListener<C>>>>,
}

impl<C: Connection> InvitationListenerRegistry<C> {
    pub fn new() -> Self {
        InvitationListenerRegistry {
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, listener: Arc<dyn InvitationListener<C>>) {
        self.lock().push(listener);
    }

    /// Removes the first entry holding the same listener; removing a listener
    /// that was never added is a no-op.
    pub fn remove(&self, listener: &Arc<dyn InvitationListener<C>>) -> bool {
        let mut listeners = self.lock();
        match listeners.iter().position(|entry| Arc::ptr_eq(entry, listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Vec<Arc<dyn InvitationListener<C>>> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn InvitationListener<C>>>> {
        // No lock is ever held across listener code, so a poisoned guard can
        // only mean a panic inside Vec bookkeeping. Keep going.
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionId, MessageListener, SendError};

    struct NullConnection(ConnectionId);

    impl Connection for NullConnection {
        fn id(&self) -> ConnectionId {
            self.0
        }

        fn send_message(&self, _message: &Message) -> Result<(), SendError> {
            Ok(())
        }

        fn add_message_listener(&self, _listener: MessageListener) {}
    }

    fn noop_listener() -> Arc<dyn InvitationListener<NullConnection>> {
        listener_fn(|_invitation| {})
    }

    #[test]
    fn test_duplicate_registration_yields_two_entries() {
        let registry = InvitationListenerRegistry::<NullConnection>::new();
        let listener = noop_listener();
        registry.add(listener.clone());
        registry.add(listener.clone());
        assert_eq!(registry.snapshot().len(), 2);

        // Removal is by identity and takes one entry at a time.
        assert!(registry.remove(&listener));
        assert_eq!(registry.snapshot().len(), 1);
        assert!(registry.remove(&listener));
        assert!(!registry.remove(&listener));
    }

    #[test]
    fn test_removing_unknown_listener_is_a_noop() {
        let registry = InvitationListenerRegistry::<NullConnection>::new();
        registry.add(noop_listener());
        assert!(!registry.remove(&noop_listener()));
        assert_eq!(registry.snapshot().len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_mutation() {
        let registry = InvitationListenerRegistry::<NullConnection>::new();
        let listener = noop_listener();
        registry.add(listener.clone());
        let snapshot = registry.snapshot();
        registry.remove(&listener);
        assert_eq!(snapshot.len(), 1);
        assert!(registry.snapshot().is_empty());
    }
}
