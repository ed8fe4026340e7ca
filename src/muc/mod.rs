pub mod invitation;
pub mod invitation_manager;
pub mod multi_user_chat;
