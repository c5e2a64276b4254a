//! Configuration for the homework status poller.
//!
//! Two sources feed the poller:
//!
//! - [`Settings`]: tunables from an optional `homework-bot.json` file,
//!   every field defaulted.
//! - [`Credentials`]: the three secrets, read from the environment (and a
//!   `.env` file when present). All three are required.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PollerError, Result};

/// The default settings file name.
const CONFIG_FILE_NAME: &str = "homework-bot.json";

/// Environment variable holding the homework API token.
pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";

/// Environment variable holding the Telegram bot token.
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";

/// Environment variable holding the target chat id.
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Default homework statuses endpoint.
fn default_endpoint() -> String {
    crate::api::DEFAULT_ENDPOINT.to_string()
}

/// Default Telegram Bot API base URL.
fn default_telegram_api_url() -> String {
    homework_telegram::DEFAULT_API_URL.to_string()
}

/// Default pause between polling iterations, in seconds.
const fn default_retry_interval() -> u64 {
    600
}

/// Poller tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Pause between polling iterations in seconds.
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,

    /// Homework statuses endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Telegram Bot API base URL.
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    /// Per-request timeout in seconds; unset keeps the HTTP client default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retry_interval_secs: default_retry_interval(),
            endpoint: default_endpoint(),
            telegram_api_url: default_telegram_api_url(),
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Loads settings from the current working directory.
    ///
    /// Looks for `homework-bot.json`; falls back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            PollerError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads settings from `homework-bot.json` in the given directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads settings from a specific file path.
    ///
    /// A missing file yields the defaults. Unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns `PollerError::ConfigParse` if the file cannot be read or is
    /// not valid JSON, and `PollerError::ConfigValidation` if a value is out
    /// of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                settings.validate()?;
                return Ok(settings);
            }
            Err(e) => {
                return Err(PollerError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let settings: Self = serde_json::from_str(&contents)
            .map_err(|e| PollerError::config_parse(path, e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates the settings values.
    ///
    /// - `retry_interval_secs` must be greater than 0
    /// - `endpoint` and `telegram_api_url` must be non-empty http(s) URLs
    /// - `request_timeout_secs`, when set, must be greater than 0
    ///
    /// # Errors
    ///
    /// Returns `PollerError::ConfigValidation` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.retry_interval_secs == 0 {
            return Err(PollerError::config_validation(
                "retryIntervalSecs must be greater than 0",
                "Set retryIntervalSecs to at least 1 in your homework-bot.json or pass --interval",
            ));
        }

        if !is_http_url(&self.endpoint) {
            return Err(PollerError::config_validation(
                format!("endpoint must be an http(s) URL, got '{}'", self.endpoint),
                "Remove endpoint from your homework-bot.json to use the default",
            ));
        }

        if !is_http_url(&self.telegram_api_url) {
            return Err(PollerError::config_validation(
                format!(
                    "telegramApiUrl must be an http(s) URL, got '{}'",
                    self.telegram_api_url
                ),
                "Remove telegramApiUrl from your homework-bot.json to use the default",
            ));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(PollerError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Remove requestTimeoutSecs to keep the HTTP client default",
            ));
        }

        Ok(())
    }

    /// Pause between polling iterations.
    #[must_use]
    pub const fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    /// Per-request timeout, if configured.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

/// The secrets required to run.
///
/// Tokens are redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Homework API OAuth token.
    pub practicum_token: String,
    /// Telegram bot token.
    pub telegram_token: String,
    /// Target chat id.
    pub telegram_chat_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("practicum_token", &"<redacted>")
            .field("telegram_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

impl Credentials {
    /// Reads credentials from the process environment.
    ///
    /// A `.env` file in the working directory (or a parent) is loaded first
    /// if present; variables already set in the environment win.
    ///
    /// # Errors
    ///
    /// Returns `PollerError::MissingCredentials` naming every variable that is
    /// unset or blank.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads credentials through an arbitrary lookup function.
    ///
    /// Values are trimmed; blank values count as missing.
    ///
    /// # Errors
    ///
    /// Returns `PollerError::MissingCredentials` naming every missing variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let practicum_token = read(PRACTICUM_TOKEN_VAR);
        let telegram_token = read(TELEGRAM_TOKEN_VAR);
        let telegram_chat_id = read(TELEGRAM_CHAT_ID_VAR);

        match (practicum_token, telegram_token, telegram_chat_id) {
            (Some(practicum_token), Some(telegram_token), Some(telegram_chat_id)) => Ok(Self {
                practicum_token,
                telegram_token,
                telegram_chat_id,
            }),
            (practicum_token, telegram_token, telegram_chat_id) => {
                let missing = [
                    (PRACTICUM_TOKEN_VAR, practicum_token.is_none()),
                    (TELEGRAM_TOKEN_VAR, telegram_token.is_none()),
                    (TELEGRAM_CHAT_ID_VAR, telegram_chat_id.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, missing)| missing.then_some(name));
                Err(PollerError::missing_credentials(missing))
            }
        }
    }
}
