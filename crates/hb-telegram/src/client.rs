use std::sync::Arc;

use async_trait::async_trait;
use teloxide::{
    dispatching::{Dispatcher, ShutdownToken},
    dptree,
    prelude::*,
    types::BotCommand,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use hb_core::{
    commands::CommandRegistry, config::Config, errors::Error, lifecycle::BotClient,
    messaging::port::MessagingPort, Result,
};

use crate::handlers::{self, HandlerState};
use crate::TelegramMessenger;

struct Running {
    token: ShutdownToken,
    task: JoinHandle<()>,
}

/// Long-polling Telegram client driven by a teloxide [`Dispatcher`].
///
/// teloxide's own Ctrl-C handler is left disabled; shutdown is driven from the
/// outside through [`BotClient`].
pub struct TelegramClient {
    bot: Option<Bot>,
    registry: Arc<CommandRegistry>,
    running: Option<Running>,
}

impl TelegramClient {
    pub fn new(cfg: &Config, registry: CommandRegistry) -> Result<Self> {
        let mut bot = Bot::new(cfg.telegram_bot_token.clone());
        if let Some(url) = &cfg.telegram_api_url {
            let parsed = reqwest::Url::parse(url)
                .map_err(|e| Error::Config(format!("invalid TELEGRAM_API_URL {url:?}: {e}")))?;
            bot = bot.set_api_url(parsed);
        }

        Ok(Self {
            bot: Some(bot),
            registry: Arc::new(registry),
            running: None,
        })
    }

    fn bot(&self) -> Result<Bot> {
        self.bot
            .clone()
            .ok_or_else(|| Error::External("telegram client already released".to_string()))
    }
}

fn bot_commands(registry: &CommandRegistry, messenger: &dyn MessagingPort) -> Vec<BotCommand> {
    registry
        .menu(messenger.capabilities())
        .into_iter()
        .map(|(name, description)| BotCommand::new(name, description))
        .collect()
}

#[async_trait]
impl BotClient for TelegramClient {
    async fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Err(Error::External("telegram client already started".to_string()));
        }
        let bot = self.bot()?;

        let me = bot
            .get_me()
            .await
            .map_err(|e| Error::External(format!("telegram authentication failed: {e}")))?;
        info!(username = %me.username(), "authenticated with Telegram");

        let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));

        let menu = bot_commands(&self.registry, messenger.as_ref());
        if !menu.is_empty() {
            if let Err(e) = bot.set_my_commands(menu).await {
                warn!(error = %e, "failed to publish command menu");
            }
        }
        let state = Arc::new(HandlerState {
            registry: self.registry.clone(),
            messenger,
        });

        let handler = Update::filter_message().endpoint(handlers::handle_message);

        let mut dispatcher = Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![state])
            .default_handler(|_| async {})
            .build();
        let token = dispatcher.shutdown_token();
        let task = tokio::spawn(async move { dispatcher.dispatch().await });

        self.running = Some(Running { token, task });
        info!(commands = self.registry.len(), "dispatcher started");
        Ok(())
    }

    async fn stop_accepting(&mut self) -> Result<()> {
        let Some(running) = &self.running else {
            return Ok(());
        };

        match running.token.shutdown() {
            // Polling stops as soon as shutdown is requested; `stop` waits for the drain.
            Ok(_drained) => debug!("dispatcher asked to stop polling"),
            Err(_) => {
                debug!("dispatcher not polling yet; aborting task");
                running.task.abort();
            }
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        match running.task.await {
            Ok(()) => {
                info!("dispatcher stopped");
                Ok(())
            }
            Err(e) if e.is_cancelled() => {
                info!("dispatcher cancelled before it started polling");
                Ok(())
            }
            Err(e) => Err(Error::External(format!("telegram dispatcher failed: {e}"))),
        }
    }

    async fn release(&mut self) -> Result<()> {
        if self.bot.take().is_some() {
            debug!("telegram client released");
        }
        Ok(())
    }
}
