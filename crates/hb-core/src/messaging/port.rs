use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::MessagingCapabilities,
    Result,
};

/// Outbound side of a messenger.
///
/// Command handlers only see this trait, so they can be driven by a fake in
/// tests and by the Telegram adapter in production.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    /// Send a plain-text message to `chat_id`.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;
}
