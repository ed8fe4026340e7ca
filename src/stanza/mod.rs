pub mod error;
pub mod group_chat_invitation;
pub mod message;
pub mod muc_user;
