//! Chat notification delivery.

use async_trait::async_trait;
use homework_telegram::TelegramBot;
use tracing::{info, instrument};

use crate::config::{Credentials, Settings};
use crate::error::{PollerError, Result};

/// Delivers text messages to the configured chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `message`.
    ///
    /// # Errors
    ///
    /// Returns `PollerError::Delivery` if the message could not be delivered.
    async fn notify(&self, message: &str) -> Result<()>;
}

/// [`Notifier`] backed by a Telegram bot and a single chat.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    bot: TelegramBot,
    chat_id: String,
}

impl TelegramNotifier {
    /// Creates a notifier sending through `bot` to `chat_id`.
    #[must_use]
    pub fn new(bot: TelegramBot, chat_id: impl Into<String>) -> Self {
        Self {
            bot,
            chat_id: chat_id.into(),
        }
    }

    /// Builds a notifier from loaded settings and credentials.
    #[must_use]
    pub fn from_config(settings: &Settings, credentials: &Credentials) -> Self {
        let bot = TelegramBot::new(&credentials.telegram_token)
            .with_api_url(&settings.telegram_api_url);
        Self::new(bot, &credentials.telegram_chat_id)
    }

    /// The underlying bot client.
    #[must_use]
    pub const fn bot(&self) -> &TelegramBot {
        &self.bot
    }

    /// The target chat id.
    #[must_use]
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[instrument(skip(self, message), fields(chat_id = %self.chat_id))]
    async fn notify(&self, message: &str) -> Result<()> {
        let sent = self
            .bot
            .send_message(&self.chat_id, message)
            .await
            .map_err(PollerError::Delivery)?;
        info!(message_id = sent.message_id, "Message sent");
        Ok(())
    }
}
