//! Homework statuses API client.
//!
//! [`PracticumClient`] performs a single `GET` per call and classifies every
//! failure into the poller's error taxonomy. It never retries: the poll loop
//! interval is the retry mechanism.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::{Credentials, Settings};
use crate::cursor::PollCursor;
use crate::error::{PollerError, Result};

/// Default homework statuses endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Fields that signal an application-level failure in a 200 response.
const FAULT_FIELDS: [&str; 2] = ["error", "code"];

/// Source of raw homework status payloads.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetches the statuses changed since `cursor`.
    ///
    /// Returns the decoded payload; shape validation is left to
    /// [`crate::validate_response`].
    async fn fetch(&self, cursor: PollCursor) -> Result<Value>;
}

/// Client for the Practicum homework statuses endpoint.
#[derive(Clone)]
pub struct PracticumClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl std::fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PracticumClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl PracticumClient {
    /// Creates a client for `endpoint` authenticating with `token`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint, token)
    }

    /// Creates a client reusing an existing reqwest [`Client`].
    #[must_use]
    pub fn with_client(
        client: Client,
        endpoint: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    /// Builds a client from loaded settings and credentials.
    ///
    /// # Errors
    ///
    /// Returns `PollerError::ConfigValidation` if the HTTP client cannot be
    /// constructed (e.g. TLS backend initialization fails).
    pub fn from_config(settings: &Settings, credentials: &Credentials) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            PollerError::config_validation(
                format!("cannot build HTTP client: {e}"),
                "Check the system TLS configuration",
            )
        })?;
        Ok(Self::with_client(
            client,
            &settings.endpoint,
            &credentials.practicum_token,
        ))
    }

    /// Returns the endpoint being polled.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StatusSource for PracticumClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch(&self, cursor: PollCursor) -> Result<Value> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", cursor.as_i64())])
            .send()
            .await
            .map_err(|e| PollerError::transport(&e))?;

        let url = response.url().to_string();
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(PollerError::unexpected_status(status.as_u16(), url, &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PollerError::transport(&e))?;
        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| PollerError::invalid_body(&url, e.to_string()))?;
        check_api_fault(&payload)?;

        info!(from_date = %cursor, "Fetched homework statuses");
        debug!(bytes = body.len(), "Response body size");
        Ok(payload)
    }
}

/// Rejects payloads that carry an `error` or `code` field.
///
/// The API reports some failures (expired token, malformed `from_date`) with
/// a 200 status and one of these fields in the body.
///
/// # Errors
///
/// Returns `PollerError::ApiFault` naming the first fault field found.
pub fn check_api_fault(payload: &Value) -> Result<()> {
    let Some(fields) = payload.as_object() else {
        return Ok(());
    };
    for field in FAULT_FIELDS {
        if let Some(value) = fields.get(field) {
            let detail = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            return Err(PollerError::api_fault(field, detail));
        }
    }
    Ok(())
}
