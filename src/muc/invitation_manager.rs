use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use jid::{BareJid, Jid};
use tracing::{Level, event, instrument};

use super::invitation::{Invitation, InvitationListener, InvitationListenerRegistry};
use super::multi_user_chat::MultiUserChat;
use crate::connection::{Connection, ConnectionId};
use crate::stanza::message::{Message, MessageType};
use crate::stanza::muc_user::MucUser;

/// Per-connection dispatcher for mediated invitations.
///
/// On construction it registers a single message listener with the connection
/// and from then on classifies every inbound message: no `muc#user` invite
/// means the stanza is ignored, a malformed one is dropped and logged, and a
/// well-formed one is delivered to every registered invitation listener,
/// synchronously and in registration order.
///
/// Direct invitations (XEP-0249) are deliberately not dispatched here; they
/// are a send-side feature of [`MultiUserChat`].
pub struct InvitationManager<C: Connection> {
    connection: Arc<C>,
    listeners: InvitationListenerRegistry<C>,
    rooms: Mutex<HashMap<BareJid, Arc<MultiUserChat<C>>>>,
    detached: AtomicBool,
}

impl<C: Connection> InvitationManager<C> {
    /// Creates the manager for `connection` and hooks it into the connection's
    /// inbound delivery path.
    ///
    /// Most applications should go through
    /// [`InvitationManagerRegistry::manager_for`] instead, which caches one
    /// manager per connection.
    pub fn attach(connection: Arc<C>) -> Arc<Self> {
        let manager = Arc::new(InvitationManager {
            connection,
            listeners: InvitationListenerRegistry::new(),
            rooms: Mutex::new(HashMap::new()),
            detached: AtomicBool::new(false),
        });

        // The connection keeps only a weak handle, so dispatch stops once the
        // manager is dropped even if the connection outlives it.
        let weak = Arc::downgrade(&manager);
        manager.connection.add_message_listener(Arc::new(move |message| {
            if let Some(manager) = weak.upgrade() {
                manager.process_message(message);
            }
        }));

        manager
    }

    pub fn connection(&self) -> &Arc<C> {
        &self.connection
    }

    /// Registers a listener for inbound mediated invitations.
    ///
    /// Registering the same `Arc` twice is allowed and yields two callbacks
    /// per invitation.
    pub fn add_invitation_listener(&self, listener: Arc<dyn InvitationListener<C>>) {
        self.listeners.add(listener);
    }

    /// Removes one registration of `listener`; unknown listeners are a no-op.
    /// A dispatch pass already snapshotted still delivers to it once.
    pub fn remove_invitation_listener(&self, listener: &Arc<dyn InvitationListener<C>>) -> bool {
        self.listeners.remove(listener)
    }

    /// Returns the room handle for `room`, creating it on first use.
    ///
    /// Repeated calls for the same address return the same instance; a
    /// concurrent first resolution races under one lock, so exactly one
    /// handle wins and both callers observe it.
    pub fn get_multi_user_chat(&self, room: &BareJid) -> Arc<MultiUserChat<C>> {
        let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
        rooms
            .entry(room.clone())
            .or_insert_with(|| Arc::new(MultiUserChat::new(Arc::clone(&self.connection), room.clone())))
            .clone()
    }

    /// Stops dispatch and releases listeners and room handles.
    ///
    /// Called by [`InvitationManagerRegistry::detach`] when the connection
    /// goes away; after this no listener fires again, even while the
    /// connection's delivery machinery is still winding down.
    pub fn shutdown(&self) {
        self.detached.store(true, Ordering::Release);
        self.listeners.clear();
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    #[instrument(skip_all, name = "invitation_dispatch", fields(id = message.id()))]
    fn process_message(&self, message: &Message) {
        if self.detached.load(Ordering::Acquire) {
            return;
        }
        if message.message_type() == MessageType::Error {
            // A bounced invitation comes back as a message of type error;
            // nothing to dispatch.
            return;
        }

        let muc_user = match MucUser::from_message(message) {
            Ok(Some(muc_user)) => muc_user,
            // Not an invitation; none of our business.
            Ok(None) => return,
            Err(e) => {
                event!(Level::WARN, "Dropping message with malformed muc#user extension: {}", e);
                return;
            }
        };
        let Some(invite) = muc_user.invite() else {
            // muc#user without an invite is status traffic for other layers.
            return;
        };
        let Some(inviter) = invite.from() else {
            // A to-only invite is the client-to-room request shape; a room
            // must never relay one to us.
            event!(Level::WARN, "Dropping mediated invitation that does not name its inviter");
            return;
        };
        let Some(room_address) = message.from().map(Jid::to_bare) else {
            event!(Level::WARN, "Dropping mediated invitation with no originating room address");
            return;
        };

        let room = self.get_multi_user_chat(&room_address);
        let snapshot = self.listeners.snapshot();
        event!(
            Level::DEBUG,
            room = %room_address,
            inviter = %inviter,
            listeners = snapshot.len(),
            "Dispatching mediated invitation"
        );

        for listener in snapshot {
            let invitation = Invitation {
                connection: self.connection.as_ref(),
                room: &room,
                inviter,
                reason: invite.reason(),
                password: muc_user.password(),
                message,
                invite: Some(invite),
            };
            // One faulty listener must not starve the rest of the pass.
            if panic::catch_unwind(AssertUnwindSafe(|| listener.invitation_received(invitation))).is_err() {
                event!(Level::ERROR, "Invitation listener panicked; continuing with remaining listeners");
            }
        }
    }
}

/// Explicit per-process cache of invitation managers, one per connection.
///
/// Replaces the usual singleton-per-connection pattern with state the
/// application owns: create managers on first use with
/// [`manager_for`](Self::manager_for) and tear them down from the
/// connection's disconnect hook with [`detach`](Self::detach).
pub struct InvitationManagerRegistry<C: Connection> {
    managers: Mutex<HashMap<ConnectionId, Arc<InvitationManager<C>>>>,
}

impl<C: Connection> InvitationManagerRegistry<C> {
    pub fn new() -> Self {
        InvitationManagerRegistry {
            managers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the manager for `connection`, attaching one on first use.
    /// Repeated calls for the same connection return the same instance.
    pub fn manager_for(&self, connection: &Arc<C>) -> Arc<InvitationManager<C>> {
        let mut managers = self.managers.lock().unwrap_or_else(PoisonError::into_inner);
        managers
            .entry(connection.id())
            .or_insert_with(|| InvitationManager::attach(Arc::clone(connection)))
            .clone()
    }

    /// Teardown hook for a disconnected connection. Idempotent.
    #[instrument(skip_all, fields(connection = ?connection_id))]
    pub fn detach(&self, connection_id: ConnectionId) {
        let manager = self
            .managers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&connection_id);
        if let Some(manager) = manager {
            manager.shutdown();
            event!(Level::DEBUG, "Detached invitation manager");
        }
    }
}

impl<C: Connection> Default for InvitationManagerRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
