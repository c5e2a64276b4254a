//! Homework Bot Telegram Client
//!
//! Thin Telegram Bot API client over reqwest.
//!
//! This crate exposes only what the notifier needs: `sendMessage` for
//! delivering notifications and `getMe` as a startup health check.

mod bot;

pub use bot::{TelegramBot, DEFAULT_API_URL};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// The request could not be completed (DNS, connect, timeout, body read).
    ///
    /// Built only through `without_url()`: the request URL embeds the bot token.
    #[error("telegram request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// The Bot API answered with `ok: false`.
    #[error("telegram API error {code}: {description}")]
    Api {
        /// Error code reported by the API (falls back to the HTTP status).
        code: u16,
        /// Human-readable description reported by the API.
        description: String,
    },

    /// The response body was not a valid Bot API envelope.
    #[error("invalid telegram response (HTTP {status}): {message}")]
    Decode {
        /// HTTP status of the response.
        status: u16,
        /// Description of the decode failure.
        message: String,
    },
}

impl TelegramError {
    /// Returns `true` if retrying the same request later may succeed.
    ///
    /// Transport failures, rate limiting and server-side errors are transient;
    /// a rejected request (bad chat id, revoked token) is not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { code, .. } => *code == 429 || *code >= 500,
            Self::Decode { status, .. } => *status >= 500,
        }
    }
}

/// Envelope wrapping every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub ok: bool,
    /// Payload, present when `ok` is true.
    pub result: Option<T>,
    /// Error description, present when `ok` is false.
    #[serde(default)]
    pub description: Option<String>,
    /// Error code, present when `ok` is false.
    #[serde(default)]
    pub error_code: Option<u16>,
}

impl<T> ApiResponse<T> {
    /// Converts the envelope into its payload or an [`TelegramError::Api`].
    ///
    /// `http_status` is used as the error code when the API omits one.
    pub fn into_result(self, http_status: u16) -> Result<T, TelegramError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(TelegramError::Decode {
                status: http_status,
                message: "response has ok=true but no result".to_string(),
            }),
            (false, _) => Err(TelegramError::Api {
                code: self.error_code.unwrap_or(http_status),
                description: self
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }
}

/// A Telegram user or bot account, as returned by `getMe`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: i64,
    /// Whether this account is a bot.
    #[serde(default)]
    pub is_bot: bool,
    /// First name (or bot display name).
    pub first_name: String,
    /// Username without the leading `@`.
    #[serde(default)]
    pub username: Option<String>,
}

/// The chat a message was delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chat {
    /// Unique identifier.
    pub id: i64,
}

/// A delivered message, as returned by `sendMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    /// Identifier unique within the chat.
    pub message_id: i64,
    /// Unix time the message was sent.
    pub date: i64,
    /// Target chat.
    pub chat: Chat,
    /// Text of the message, if any.
    #[serde(default)]
    pub text: Option<String>,
}

/// Request body for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessage<'a> {
    /// Numeric chat id or `@channelusername`.
    pub chat_id: &'a str,
    /// Message text.
    pub text: &'a str,
}
