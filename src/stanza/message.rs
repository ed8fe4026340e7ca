use jid::Jid;
use minidom::Element;
use rand::Rng;
use rand::distr::Alphanumeric;

const STANZA_ID_LENGTH: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageType {
    #[default]
    Normal,
    Chat,
    GroupChat,
    Headline,
    Error,
}

/// A message stanza, reduced to the surface this crate needs: addressing,
/// an optional plain-text body and the attached extension payloads.
///
/// Serialization to the wire is the connection's concern, not ours.
#[derive(Debug, Clone)]
pub struct Message {
    id: String,
    from: Option<Jid>,
    to: Option<Jid>,
    message_type: MessageType,
    body: Option<String>,
    payloads: Vec<Element>,
}

impl Message {
    /// Creates an empty message of type `normal` with a fresh random id.
    pub fn new() -> Self {
        let id: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(STANZA_ID_LENGTH)
            .map(char::from)
            .collect();
        Self::with_id(id)
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Message {
            id: id.into(),
            from: None,
            to: None,
            message_type: MessageType::default(),
            body: None,
            payloads: Vec::new(),
        }
    }

    pub fn with_to(mut self, to: impl Into<Jid>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn with_from(mut self, from: impl Into<Jid>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_payload(mut self, payload: Element) -> Self {
        self.payloads.push(payload);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn to(&self) -> Option<&Jid> {
        self.to.as_ref()
    }

    pub fn from(&self) -> Option<&Jid> {
        self.from.as_ref()
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn payloads(&self) -> &[Element] {
        &self.payloads
    }

    /// Returns the first extension payload in the given namespace, if any.
    pub fn extension(&self, namespace: &str) -> Option<&Element> {
        self.payloads.iter().find(|payload| payload.ns() == namespace)
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_discriminates_by_namespace() {
        let message = Message::new()
            .with_payload(Element::bare("x", "jabber:x:conference"))
            .with_payload(Element::bare("x", "http://jabber.org/protocol/muc#user"));

        let direct = message.extension("jabber:x:conference").unwrap();
        assert_eq!(direct.ns(), "jabber:x:conference");
        let mediated = message.extension("http://jabber.org/protocol/muc#user").unwrap();
        assert_eq!(mediated.ns(), "http://jabber.org/protocol/muc#user");
        assert!(message.extension("urn:example:absent").is_none());
    }

    #[test]
    fn test_fresh_messages_get_distinct_ids() {
        let a = Message::new();
        let b = Message::new();
        assert_eq!(a.id().len(), STANZA_ID_LENGTH);
        assert_ne!(a.id(), b.id());
    }
}
