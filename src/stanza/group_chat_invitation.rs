use jid::BareJid;
use minidom::Element;

use super::error::ExtensionParseError;
use super::message::Message;

/// Direct invitation extension (XEP-0249).
///
/// Travels as a standalone payload on a plain message stanza, so it reaches
/// the invitee even while they are offline and have no relationship with the
/// room yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupChatInvitation {
    room_address: BareJid,
    reason: Option<String>,
    password: Option<String>,
    continue_conversation: bool,
    thread: Option<String>,
}

impl GroupChatInvitation {
    pub const NAMESPACE: &'static str = "jabber:x:conference";

    pub fn new(room_address: BareJid) -> Self {
        GroupChatInvitation {
            room_address,
            reason: None,
            password: None,
            continue_conversation: false,
            thread: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Marks the invitation as the continuation of a one-to-one chat,
    /// optionally naming the thread being continued.
    pub fn with_continuation(mut self, thread: Option<String>) -> Self {
        self.continue_conversation = true;
        self.thread = thread;
        self
    }

    pub fn room_address(&self) -> &BareJid {
        &self.room_address
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn continue_conversation(&self) -> bool {
        self.continue_conversation
    }

    pub fn thread(&self) -> Option<&str> {
        self.thread.as_deref()
    }

    /// Decodes the direct-invitation extension carried by `message`.
    ///
    /// `Ok(None)` means the message simply carries no such extension. A
    /// present but malformed extension is a protocol violation and decodes
    /// to an error instead.
    pub fn from_message(message: &Message) -> Result<Option<Self>, ExtensionParseError> {
        match message.extension(Self::NAMESPACE) {
            Some(extension) => Self::from_element(extension).map(Some),
            None => Ok(None),
        }
    }

    pub fn from_element(element: &Element) -> Result<Self, ExtensionParseError> {
        let room = element
            .attr("jid")
            .filter(|address| !address.is_empty())
            .ok_or(ExtensionParseError::MissingRoomAddress)?;
        let room_address = BareJid::new(room).map_err(|e| ExtensionParseError::InvalidJid("jid", e))?;

        Ok(GroupChatInvitation {
            room_address,
            reason: element.attr("reason").map(str::to_owned),
            password: element.attr("password").map(str::to_owned),
            continue_conversation: element.attr("continue") == Some("true"),
            thread: element.attr("thread").map(str::to_owned),
        })
    }

    pub fn to_element(&self) -> Element {
        let mut builder = Element::builder("x", Self::NAMESPACE).attr("jid", self.room_address.to_string());
        if let Some(reason) = &self.reason {
            builder = builder.attr("reason", reason.as_str());
        }
        if let Some(password) = &self.password {
            builder = builder.attr("password", password.as_str());
        }
        if self.continue_conversation {
            builder = builder.attr("continue", "true");
            if let Some(thread) = &self.thread {
                builder = builder.attr("thread", thread.as_str());
            }
        }
        builder.build()
    }
}

impl From<GroupChatInvitation> for Element {
    fn from(invitation: GroupChatInvitation) -> Self {
        invitation.to_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> BareJid {
        BareJid::new("room@example.com").unwrap()
    }

    #[test]
    fn test_message_without_extension_is_none() {
        let message = Message::new();
        assert!(GroupChatInvitation::from_message(&message).unwrap().is_none());
    }

    #[test]
    fn test_room_address_survives_verbatim() {
        let element = GroupChatInvitation::new(room()).to_element();
        assert_eq!(element.attr("jid"), Some("room@example.com"));

        let decoded = GroupChatInvitation::from_element(&element).unwrap();
        assert_eq!(decoded.room_address().to_string(), "room@example.com");
        assert!(decoded.reason().is_none());
        assert!(decoded.password().is_none());
        assert!(!decoded.continue_conversation());
    }

    #[test]
    fn test_missing_room_address_is_a_violation_not_absence() {
        let element = Element::bare("x", GroupChatInvitation::NAMESPACE);
        let message = Message::new().with_payload(element);
        assert!(matches!(
            GroupChatInvitation::from_message(&message),
            Err(ExtensionParseError::MissingRoomAddress)
        ));
    }

    #[test]
    fn test_empty_room_address_is_a_violation() {
        let element = Element::builder("x", GroupChatInvitation::NAMESPACE).attr("jid", "").build();
        assert!(matches!(
            GroupChatInvitation::from_element(&element),
            Err(ExtensionParseError::MissingRoomAddress)
        ));
    }

    #[test]
    fn test_optional_fields_decode() {
        let invitation = GroupChatInvitation::new(room())
            .with_reason("planning")
            .with_password("cauldronburn")
            .with_continuation(Some("e0ffe42b".to_owned()));
        let decoded = GroupChatInvitation::from_element(&invitation.to_element()).unwrap();
        assert_eq!(decoded, invitation);
        assert_eq!(decoded.reason(), Some("planning"));
        assert_eq!(decoded.password(), Some("cauldronburn"));
        assert!(decoded.continue_conversation());
        assert_eq!(decoded.thread(), Some("e0ffe42b"));
    }
}
