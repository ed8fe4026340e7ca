use std::sync::Arc;

use jid::{BareJid, Jid};
use tracing::{Level, event, instrument};

use crate::connection::{Connection, SendError};
use crate::stanza::group_chat_invitation::GroupChatInvitation;
use crate::stanza::message::Message;
use crate::stanza::muc_user::{Invite, MucUser};

/// Handle for one room as known to one connection.
///
/// Handles are created by
/// [`InvitationManager::get_multi_user_chat`](super::invitation_manager::InvitationManager::get_multi_user_chat),
/// which guarantees at most one live instance per (connection, room address)
/// pair. Sending an invitation is fire-and-forget; a failed send surfaces as a
/// [`SendError`] and is never retried here.
pub struct MultiUserChat<C: Connection> {
    connection: Arc<C>,
    room: BareJid,
}

impl<C: Connection> MultiUserChat<C> {
    pub(crate) fn new(connection: Arc<C>, room: BareJid) -> Self {
        MultiUserChat { connection, room }
    }

    pub fn room(&self) -> &BareJid {
        &self.room
    }

    pub fn connection(&self) -> &Arc<C> {
        &self.connection
    }

    /// Sends a direct invitation (XEP-0249) for this room to `invitee`.
    ///
    /// Works without any involvement of the room, so it reaches invitees that
    /// are offline. Returns the stanza that went out on the wire.
    pub fn invite_directly(&self, invitee: &BareJid) -> Result<Message, SendError> {
        self.invite_directly_with(invitee, None, None, None)
    }

    /// Like [`invite_directly`](Self::invite_directly), with optional reason,
    /// room password and human-readable fallback body.
    #[instrument(skip_all, fields(room = %self.room, invitee = %invitee))]
    pub fn invite_directly_with(
        &self,
        invitee: &BareJid,
        reason: Option<&str>,
        password: Option<&str>,
        body: Option<&str>,
    ) -> Result<Message, SendError> {
        let mut invitation = GroupChatInvitation::new(self.room.clone());
        if let Some(reason) = reason {
            invitation = invitation.with_reason(reason);
        }
        if let Some(password) = password {
            invitation = invitation.with_password(password);
        }

        let mut message = Message::new().with_to(invitee.clone()).with_payload(invitation.to_element());
        if let Some(body) = body {
            message = message.with_body(body);
        }

        self.connection.send_message(&message)?;
        event!(Level::INFO, "Sent direct invitation");
        Ok(message)
    }

    /// Asks the room to mediate an invitation to `invitee` (XEP-0045 §7.8.2).
    ///
    /// The room relays it to the invitee from its own address, so this only
    /// works while the room is reachable for us.
    #[instrument(skip_all, fields(room = %self.room, invitee = %invitee))]
    pub fn invite(&self, invitee: &Jid, reason: &str) -> Result<Message, SendError> {
        let invite = Invite::to_invitee(invitee.clone()).with_reason(reason);
        let message = Message::new()
            .with_to(self.room.clone())
            .with_payload(MucUser::new().with_invite(invite).to_element());

        self.connection.send_message(&message)?;
        event!(Level::INFO, "Sent mediated invitation via room");
        Ok(message)
    }
}
