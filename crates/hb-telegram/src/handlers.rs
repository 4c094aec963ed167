//! Telegram update handlers.

use std::sync::Arc;

use teloxide::prelude::*;

use hb_core::{
    commands::{parse_command, CommandRegistry},
    domain::{ChatId, UserId},
    messaging::{port::MessagingPort, types::Command},
    Result,
};

/// Dependencies injected into every update handler.
pub struct HandlerState {
    pub registry: Arc<CommandRegistry>,
    pub messenger: Arc<dyn MessagingPort>,
}

/// Route `/command` messages through the registry; ignore everything else.
///
/// Errors are returned to the dispatcher, whose error handler logs them.
pub async fn handle_message(msg: Message, state: Arc<HandlerState>) -> Result<()> {
    let Some(cmd) = command_from_message(&msg) else {
        return Ok(());
    };

    state
        .registry
        .dispatch(&cmd, state.messenger.as_ref())
        .await?;
    Ok(())
}

pub fn command_from_message(msg: &Message) -> Option<Command> {
    let (name, args) = parse_command(msg.text()?)?;
    let user = msg.from();

    Some(Command {
        chat_id: ChatId(msg.chat.id.0),
        user_id: user.map(|u| UserId(u.id.0 as i64)),
        username: user.and_then(|u| u.username.clone()),
        name,
        args,
    })
}
