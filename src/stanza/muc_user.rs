use jid::Jid;
use minidom::Element;

use super::error::ExtensionParseError;
use super::message::Message;

/// Marks a mediated invitation as the continuation of a one-to-one chat
/// (XEP-0045 §7.8.1), optionally naming the thread being continued.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Continue {
    pub thread: Option<String>,
}

/// The `invite` sub-element of a `muc#user` extension.
///
/// Rooms relay it with a `from` attribute naming the inviter; clients asking a
/// room to mediate use the `to` attribute instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invite {
    from: Option<Jid>,
    to: Option<Jid>,
    reason: Option<String>,
    continuation: Option<Continue>,
}

impl Invite {
    /// Room-to-invitee shape, as seen on inbound mediated invitations.
    pub fn from_inviter(from: Jid) -> Self {
        Invite {
            from: Some(from),
            to: None,
            reason: None,
            continuation: None,
        }
    }

    /// Client-to-room shape, used when asking a room to mediate an invitation.
    pub fn to_invitee(to: Jid) -> Self {
        Invite {
            from: None,
            to: Some(to),
            reason: None,
            continuation: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_continuation(mut self, thread: Option<String>) -> Self {
        self.continuation = Some(Continue { thread });
        self
    }

    pub fn from(&self) -> Option<&Jid> {
        self.from.as_ref()
    }

    pub fn to(&self) -> Option<&Jid> {
        self.to.as_ref()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn continuation(&self) -> Option<&Continue> {
        self.continuation.as_ref()
    }

    fn from_element(element: &Element) -> Result<Self, ExtensionParseError> {
        let from = match element.attr("from") {
            Some(from) => Some(Jid::new(from).map_err(|e| ExtensionParseError::InvalidJid("from", e))?),
            None => None,
        };
        let to = match element.attr("to") {
            Some(to) => Some(Jid::new(to).map_err(|e| ExtensionParseError::InvalidJid("to", e))?),
            None => None,
        };
        let reason = element
            .get_child("reason", MucUser::NAMESPACE)
            .map(|reason| reason.text())
            .filter(|reason| !reason.is_empty());
        let continuation = element.get_child("continue", MucUser::NAMESPACE).map(|cont| Continue {
            thread: cont.attr("thread").map(str::to_owned),
        });

        Ok(Invite {
            from,
            to,
            reason,
            continuation,
        })
    }

    fn to_element(&self) -> Element {
        let mut builder = Element::builder("invite", MucUser::NAMESPACE);
        if let Some(from) = &self.from {
            builder = builder.attr("from", from.to_string());
        }
        if let Some(to) = &self.to {
            builder = builder.attr("to", to.to_string());
        }
        if let Some(reason) = &self.reason {
            builder = builder.append(Element::builder("reason", MucUser::NAMESPACE).append(reason.clone()).build());
        }
        if let Some(continuation) = &self.continuation {
            let mut cont = Element::builder("continue", MucUser::NAMESPACE);
            if let Some(thread) = &continuation.thread {
                cont = cont.attr("thread", thread.as_str());
            }
            builder = builder.append(cont.build());
        }
        builder.build()
    }
}

/// The `muc#user` status extension (XEP-0045), reduced to the parts this crate
/// dispatches on: at most one mediated `invite` plus the room password.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MucUser {
    invite: Option<Invite>,
    password: Option<String>,
}

impl MucUser {
    pub const NAMESPACE: &'static str = "http://jabber.org/protocol/muc#user";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_invite(mut self, invite: Invite) -> Self {
        self.invite = Some(invite);
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn invite(&self) -> Option<&Invite> {
        self.invite.as_ref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Decodes the `muc#user` extension carried by `message`.
    ///
    /// `Ok(None)` means the message carries no such extension. Both wire
    /// shapes of the invite decode: `from` on room-relayed invitations, `to`
    /// on client-to-room requests. An invite naming neither party, or an
    /// extension with more than one invite, is a protocol violation.
    pub fn from_message(message: &Message) -> Result<Option<Self>, ExtensionParseError> {
        match message.extension(Self::NAMESPACE) {
            Some(extension) => Self::from_element(extension).map(Some),
            None => Ok(None),
        }
    }

    pub fn from_element(element: &Element) -> Result<Self, ExtensionParseError> {
        let mut invites = element.children().filter(|child| child.is("invite", Self::NAMESPACE));
        let invite = match (invites.next(), invites.next()) {
            (Some(_), Some(_)) => return Err(ExtensionParseError::DuplicateInvite),
            (Some(invite), None) => Some(Invite::from_element(invite)?),
            (None, _) => None,
        };
        if invite.as_ref().is_some_and(|invite| invite.from().is_none() && invite.to().is_none()) {
            return Err(ExtensionParseError::UnaddressedInvite);
        }
        let password = element
            .get_child("password", Self::NAMESPACE)
            .map(|password| password.text())
            .filter(|password| !password.is_empty());

        Ok(MucUser { invite, password })
    }

    pub fn to_element(&self) -> Element {
        let mut builder = Element::builder("x", Self::NAMESPACE);
        if let Some(invite) = &self.invite {
            builder = builder.append(invite.to_element());
        }
        if let Some(password) = &self.password {
            builder = builder.append(Element::builder("password", Self::NAMESPACE).append(password.clone()).build());
        }
        builder.build()
    }
}

impl From<MucUser> for Element {
    fn from(muc_user: MucUser) -> Self {
        muc_user.to_element()
    }
}
