use thiserror::Error;

/// Protocol violations found while decoding an invitation payload.
///
/// A well-formed stanza that simply carries no invitation extension is not an
/// error; decoders report that case as `Ok(None)`.
#[derive(Debug, Error)]
pub enum ExtensionParseError {
    #[error("room address is missing or empty")]
    MissingRoomAddress,
    #[error("invite element names neither inviter nor invitee")]
    UnaddressedInvite,
    #[error("more than one invite element in a single muc#user extension")]
    DuplicateInvite,
    #[error("invalid jid in '{0}': {1}")]
    InvalidJid(&'static str, #[source] jid::Error),
}
