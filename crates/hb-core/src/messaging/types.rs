use crate::domain::{ChatId, UserId};

/// An inbound bot command (`/name args`), already parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub chat_id: ChatId,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub name: String,
    pub args: String,
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    /// Whether the messenger can show a list of bot commands to users.
    pub supports_command_menu: bool,
}
