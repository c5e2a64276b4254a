//! Homework Review Poller
//!
//! Polls the homework statuses API, translates review verdicts and forwards
//! them to a Telegram chat.

pub mod api;
pub mod config;
pub mod cursor;
pub mod error;
pub mod notifier;
pub mod poll_loop;
pub mod response;
pub mod status;

pub use api::{check_api_fault, PracticumClient, StatusSource, DEFAULT_ENDPOINT};
pub use config::{
    Credentials, Settings, PRACTICUM_TOKEN_VAR, TELEGRAM_CHAT_ID_VAR, TELEGRAM_TOKEN_VAR,
};
pub use cursor::PollCursor;
pub use error::{ErrorKind, PollerError, Result};
pub use notifier::{Notifier, TelegramNotifier};
pub use poll_loop::{IterationOutcome, LoopState, LoopStatus, PollLoop, ERROR_MESSAGE_PREFIX};
pub use response::{validate_response, HomeworkRecord, StatusUpdate};
pub use status::{parse_status, HomeworkStatus};
