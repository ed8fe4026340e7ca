//! Rust library for XMPP Multi-User Chat invitations.
//!
//! # Features
//! - **Mediated invitations** (XEP-0045): invitations relayed by the room itself
//!   inside the `muc#user` extension of a message stanza. Inbound stanzas are
//!   decoded and fanned out to registered invitation listeners, synchronously
//!   with stanza arrival.
//! - **Direct invitations** (XEP-0249): standalone message stanzas carrying a
//!   `jabber:x:conference` extension, deliverable to users with no prior room
//!   relationship (including offline users). Send-side only.
//! - **Connection agnostic**: the transport sits behind the small
//!   [`connection::Connection`] trait, so the core works with any stanza
//!   delivery mechanism and is easy to drive from tests.
//!
//! ## Unsupported Features
//! - Invitation *acceptance* (actually joining a room) and room state
//!   management belong to the surrounding application.
//! - Invitations are not persisted; each one is decoded, delivered to the
//!   registered listeners, and discarded.
pub mod connection;
pub mod muc;
pub mod stanza;
