//! Bot commands and the table that routes them.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{Command, MessagingCapabilities},
    },
    Result,
};

/// Reply sent for `/start`.
pub const GREETING: &str = "Hello, world!";

/// Longest command name Telegram accepts in the command menu.
const MAX_COMMAND_LEN: usize = 32;

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handle one inbound command. Send errors are returned as-is.
    async fn handle(&self, cmd: &Command, messenger: &dyn MessagingPort) -> Result<()>;
}

/// `/start`: reply with a fixed greeting.
#[derive(Clone, Copy, Debug, Default)]
pub struct StartCommand;

#[async_trait]
impl CommandHandler for StartCommand {
    async fn handle(&self, cmd: &Command, messenger: &dyn MessagingPort) -> Result<()> {
        messenger.send_text(cmd.chat_id, GREETING).await?;
        Ok(())
    }
}

/// Outcome of routing a command through the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    Unknown,
}

struct Entry {
    name: String,
    description: String,
    handler: Arc<dyn CommandHandler>,
}

/// Explicit name -> handler table, validated when entries are added.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<Entry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bot's command set: just `/start`.
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        registry.register("start", "Say hello", Arc::new(StartCommand))?;
        Ok(registry)
    }

    pub fn register(
        &mut self,
        name: &str,
        description: &str,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<()> {
        validate_name(name)?;
        if description.trim().is_empty() {
            return Err(Error::Config(format!(
                "command /{name} needs a description"
            )));
        }
        if self.entries.iter().any(|e| e.name == name) {
            return Err(Error::Config(format!("command /{name} registered twice")));
        }

        self.entries.push(Entry {
            name: name.to_string(),
            description: description.trim().to_string(),
            handler,
        });
        Ok(())
    }

    /// `(name, description)` pairs in registration order.
    pub fn commands(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.description.as_str()))
            .collect()
    }

    /// Entries to publish as the messenger's command menu; empty when the
    /// messenger has no such menu.
    pub fn menu(&self, caps: MessagingCapabilities) -> Vec<(&str, &str)> {
        if !caps.supports_command_menu || self.is_empty() {
            return Vec::new();
        }
        self.commands()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn dispatch(&self, cmd: &Command, messenger: &dyn MessagingPort) -> Result<Dispatch> {
        let Some(entry) = self.entries.iter().find(|e| e.name == cmd.name) else {
            debug!(command = %cmd.name, chat_id = cmd.chat_id.0, "ignoring unknown command");
            return Ok(Dispatch::Unknown);
        };

        info!(
            command = %entry.name,
            chat_id = cmd.chat_id.0,
            user_id = cmd.user_id.map(|u| u.0),
            user = cmd.username.as_deref().unwrap_or("unknown"),
            "handling command"
        );
        if !cmd.args.is_empty() {
            debug!(command = %entry.name, args = %cmd.args, "command arguments");
        }
        entry.handler.handle(cmd, messenger).await?;
        Ok(Dispatch::Handled)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if name.is_empty() || name.len() > MAX_COMMAND_LEN || !valid_chars {
        return Err(Error::Config(format!(
            "invalid command name {name:?}: expected 1-{MAX_COMMAND_LEN} chars of [a-z0-9_]"
        )));
    }
    Ok(())
}

/// Split `/cmd@botname arg1 ...` into `("cmd", "arg1 ...")`.
///
/// Returns `None` for text that is not a command.
pub fn parse_command(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    let mut parts = text.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();
    if cmd.is_empty() {
        return None;
    }

    Some((cmd, rest))
}
