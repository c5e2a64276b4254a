//! Error types for the homework status poller.
//!
//! Every failure the poller can hit maps to exactly one [`ErrorKind`], so the
//! loop and the CLI can tell fatal configuration faults from conditions that
//! the next polling tick may clear, without matching on message text.

use std::path::PathBuf;

use homework_telegram::TelegramError;

/// A specialized `Result` type for poller operations.
pub type Result<T> = std::result::Result<T, PollerError>;

/// Maximum number of response-body characters kept in an error message.
const MAX_BODY_CHARS: usize = 512;

/// Errors that can occur while polling and notifying.
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// One or more required credentials are absent or blank.
    #[error("Missing required environment variables: {}\n\nSuggestion: Export them or add them to a .env file in the working directory", .names.join(", "))]
    MissingCredentials {
        /// Names of the missing variables.
        names: Vec<String>,
    },

    /// Invalid JSON syntax in the settings file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your homework-bot.json with a JSON linter")]
    ConfigParse {
        /// Path to the settings file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Settings validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    /// The polling cursor is not a usable timestamp.
    #[error("Invalid polling cursor {value}: expected a non-negative Unix timestamp")]
    InvalidCursor {
        /// The rejected cursor value.
        value: i64,
    },

    // ========================================================================
    // Remote API Errors
    // ========================================================================
    /// The request to the homework API could not be completed.
    #[error("Endpoint request failed: {message}")]
    Transport {
        /// Description of the transport failure, including its causes.
        message: String,
    },

    /// The homework API answered with a status other than 200.
    #[error("Endpoint {url} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Effective request URL, including the query.
        url: String,
        /// Response body (truncated), empty if unreadable.
        body: String,
    },

    /// The homework API returned 200 with an `error` or `code` field.
    #[error("API reported a failure in field '{field}': {detail}")]
    ApiFault {
        /// The field that signalled the failure (`error` or `code`).
        field: String,
        /// The field's value.
        detail: String,
    },

    /// The homework API returned a body that is not JSON.
    #[error("Endpoint {url} returned a body that is not valid JSON: {message}")]
    InvalidBody {
        /// Effective request URL.
        url: String,
        /// Description of the decode failure.
        message: String,
    },

    // ========================================================================
    // Response Shape Errors
    // ========================================================================
    /// A value in the response has the wrong JSON type.
    #[error("Unexpected type for {context}: expected {expected}, found {found}")]
    TypeMismatch {
        /// What was being checked (e.g. "response", "homeworks").
        context: String,
        /// Expected type.
        expected: String,
        /// Actual type or decode failure.
        found: String,
    },

    /// A required field is absent.
    #[error("Missing field '{field}' in {context}")]
    MissingField {
        /// Name of the missing field.
        field: String,
        /// Where the field was expected.
        context: String,
    },

    /// A homework record carries a status outside the known set.
    #[error("Unknown homework status '{status}'")]
    UnknownStatus {
        /// The unrecognized status value.
        status: String,
    },

    // ========================================================================
    // Delivery Errors
    // ========================================================================
    /// A message could not be delivered to the chat.
    #[error("Failed to deliver message: {0}")]
    Delivery(#[from] TelegramError),
}

/// The closed set of failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or invalid configuration.
    Config,
    /// Request to the homework API could not be completed.
    Transport,
    /// The homework API answered, but not with a usable success response.
    Protocol,
    /// A response value has the wrong type.
    TypeMismatch,
    /// A response value is missing a required field.
    MissingField,
    /// A homework status outside the known set.
    UnknownStatus,
    /// Chat delivery failed.
    Delivery,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Transport => write!(f, "transport"),
            Self::Protocol => write!(f, "protocol"),
            Self::TypeMismatch => write!(f, "type_mismatch"),
            Self::MissingField => write!(f, "missing_field"),
            Self::UnknownStatus => write!(f, "unknown_status"),
            Self::Delivery => write!(f, "delivery"),
        }
    }
}

impl PollerError {
    /// Creates a new `MissingCredentials` error.
    #[must_use]
    pub fn missing_credentials<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingCredentials {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a new `ConfigParse` error with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidation` error with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a `Transport` error from any error, flattening its source chain.
    #[must_use]
    pub fn transport(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Transport { message }
    }

    /// Creates a new `UnexpectedStatus` error, truncating long bodies.
    #[must_use]
    pub fn unexpected_status(status: u16, url: impl Into<String>, body: &str) -> Self {
        let body = body.trim();
        let body = match body.char_indices().nth(MAX_BODY_CHARS) {
            Some((cut, _)) => format!("{}...", &body[..cut]),
            None => body.to_string(),
        };
        Self::UnexpectedStatus {
            status,
            url: url.into(),
            body,
        }
    }

    /// Creates a new `ApiFault` error.
    #[must_use]
    pub fn api_fault(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ApiFault {
            field: field.into(),
            detail: detail.into(),
        }
    }

    /// Creates a new `InvalidBody` error.
    #[must_use]
    pub fn invalid_body(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidBody {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new `TypeMismatch` error.
    #[must_use]
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates a new `MissingField` error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            context: context.into(),
        }
    }

    /// Creates a new `UnknownStatus` error.
    #[must_use]
    pub fn unknown_status(status: impl Into<String>) -> Self {
        Self::UnknownStatus {
            status: status.into(),
        }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredentials { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigValidation { .. }
            | Self::InvalidCursor { .. } => ErrorKind::Config,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::UnexpectedStatus { .. } | Self::ApiFault { .. } | Self::InvalidBody { .. } => {
                ErrorKind::Protocol
            }
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::MissingField { .. } => ErrorKind::MissingField,
            Self::UnknownStatus { .. } => ErrorKind::UnknownStatus,
            Self::Delivery(_) => ErrorKind::Delivery,
        }
    }

    /// Returns `true` if this error is transient and the next tick may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::UnexpectedStatus { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            Self::Delivery(source) => source.is_transient(),
            _ => false,
        }
    }

    /// Returns `true` if this error must stop the process before polling starts.
    ///
    /// An invalid cursor is classed as configuration but raised inside an
    /// iteration, where it is reported like any other failure.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials { .. }
                | Self::ConfigParse { .. }
                | Self::ConfigValidation { .. }
        )
    }
}
