//! Bot API client for the homework review notifier.
//!
//! This module provides the [`TelegramBot`] struct, which wraps a reqwest
//! [`Client`] and issues Bot API calls against a configurable base URL.

use std::fmt;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::{ApiResponse, Message, SendMessage, TelegramError, User};

/// Base URL of the public Bot API.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Client for a single Telegram bot.
///
/// The token is never included in `Debug` output or in wrapped errors.
///
/// # Example
///
/// ```no_run
/// use homework_telegram::TelegramBot;
///
/// # async fn example() -> Result<(), homework_telegram::TelegramError> {
/// let bot = TelegramBot::new("123456:ABC-DEF");
/// let me = bot.get_me().await?;
/// bot.send_message("987654321", &format!("{} is online", me.first_name))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TelegramBot {
    client: Client,
    api_url: String,
    token: String,
}

impl fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramBot")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl TelegramBot {
    /// Creates a client for the bot with the given token against the public Bot API.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), token)
    }

    /// Creates a client reusing an existing reqwest [`Client`].
    #[must_use]
    pub fn with_client(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
        }
    }

    /// Overrides the Bot API base URL (self-hosted Bot API servers, tests).
    ///
    /// A trailing slash is ignored.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into();
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the Bot API base URL in use.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Checks that the token is accepted by calling `getMe`.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::Api`] if the token is rejected, or
    /// [`TelegramError::Http`] if the API is unreachable.
    #[instrument(skip(self))]
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;
        let user: User = read_envelope(response).await?;
        debug!(bot_id = user.id, username = ?user.username, "Bot token accepted");
        Ok(user)
    }

    /// Sends a plain-text message to `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::Http`] if the request cannot be completed,
    /// [`TelegramError::Api`] if Telegram rejects it (unknown chat, blocked
    /// bot, rate limit), or [`TelegramError::Decode`] if the response is not
    /// a Bot API envelope.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<Message, TelegramError> {
        let body = SendMessage { chat_id, text };
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;
        let message: Message = read_envelope(response).await?;
        debug!(message_id = message.message_id, "Message delivered");
        Ok(message)
    }

    /// Builds the URL for a Bot API method.
    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.token)
    }
}

/// Reads a Bot API envelope regardless of HTTP status.
///
/// Telegram reports failures as `ok: false` envelopes on 4xx/5xx responses,
/// so the body is decoded before the status is considered.
async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TelegramError> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| TelegramError::Http(e.without_url()))?;

    let envelope: ApiResponse<T> =
        serde_json::from_str(&body).map_err(|e| TelegramError::Decode {
            status,
            message: e.to_string(),
        })?;
    envelope.into_result(status)
}
