//! The polling loop.
//!
//! [`PollLoop`] owns the cursor and the last sent error text, and drives one
//! iteration per tick:
//!
//! 1. check the cursor
//! 2. fetch statuses since the cursor
//! 3. validate the payload
//! 4. announce the most recent record, if any
//! 5. on failure, report the error unless it repeats the last one sent
//! 6. advance the cursor to the validated `current_date`, then sleep
//!
//! The cursor only moves on a validated response, so a failed window is
//! queried again on the next tick.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::api::StatusSource;
use crate::cursor::PollCursor;
use crate::error::{ErrorKind, PollerError, Result};
use crate::notifier::Notifier;
use crate::response::{validate_response, HomeworkRecord};
use crate::status::parse_status;

/// Prefix of every error notification sent to the chat.
pub const ERROR_MESSAGE_PREFIX: &str = "Сбой в работе программы";

// ============================================================================
// LoopStatus
// ============================================================================

/// Health of the loop as of the last finished iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopStatus {
    /// The last iteration succeeded (or none has run yet).
    #[default]
    Polling,
    /// The last iteration failed.
    Recovering,
}

impl LoopStatus {
    /// Returns `true` if the last iteration failed.
    #[must_use]
    pub const fn is_recovering(&self) -> bool {
        matches!(self, Self::Recovering)
    }
}

impl std::fmt::Display for LoopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Polling => write!(f, "polling"),
            Self::Recovering => write!(f, "recovering"),
        }
    }
}

// ============================================================================
// LoopState
// ============================================================================

/// Mutable state owned by a [`PollLoop`]. Lives for the process lifetime only.
#[derive(Debug, Clone)]
pub struct LoopState {
    /// Result of the last iteration.
    pub status: LoopStatus,

    /// Lower bound of the next query window.
    pub cursor: PollCursor,

    /// Body of the most recently delivered error notification.
    pub last_error: Option<String>,

    /// Number of finished iterations.
    pub iterations: u64,

    /// Number of failed iterations since the last success.
    pub consecutive_failures: u32,

    /// When the loop was created.
    pub started_at: DateTime<Utc>,

    /// When the state last changed.
    pub updated_at: DateTime<Utc>,
}

impl LoopState {
    /// Creates a fresh state starting at `cursor`.
    #[must_use]
    pub fn new(cursor: PollCursor) -> Self {
        let now = Utc::now();
        Self {
            status: LoopStatus::Polling,
            cursor,
            last_error: None,
            iterations: 0,
            consecutive_failures: 0,
            started_at: now,
            updated_at: now,
        }
    }

    /// Updates the `updated_at` timestamp to the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Returns the duration since the loop started.
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    fn record_success(&mut self) {
        if self.status.is_recovering() {
            info!(
                failed_iterations = self.consecutive_failures,
                "Recovered after failed iterations"
            );
        }
        self.status = LoopStatus::Polling;
        self.consecutive_failures = 0;
        self.iterations += 1;
        self.touch();
    }

    fn record_failure(&mut self) {
        self.status = LoopStatus::Recovering;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.iterations += 1;
        self.touch();
    }
}

// ============================================================================
// IterationOutcome
// ============================================================================

/// What a single iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// A status change was announced.
    Notified {
        /// The message sent to the chat.
        message: String,
    },
    /// The response carried no records.
    NoUpdates,
    /// The iteration failed.
    Failed {
        /// Failure class.
        kind: ErrorKind,
        /// The error notification text.
        message: String,
        /// Whether the error notification was delivered on this iteration.
        reported: bool,
    },
}

impl IterationOutcome {
    /// Returns `true` if the iteration failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

// ============================================================================
// PollLoop
// ============================================================================

/// Polls a [`StatusSource`] and forwards status changes to a [`Notifier`].
#[derive(Debug)]
pub struct PollLoop<S, N> {
    source: S,
    notifier: N,
    interval: Duration,
    state: LoopState,
}

impl<S, N> PollLoop<S, N>
where
    S: StatusSource,
    N: Notifier,
{
    /// Creates a loop starting at `cursor` and sleeping `interval` between ticks.
    pub fn new(source: S, notifier: N, cursor: PollCursor, interval: Duration) -> Self {
        Self {
            source,
            notifier,
            interval,
            state: LoopState::new(cursor),
        }
    }

    /// Current loop state.
    pub const fn state(&self) -> &LoopState {
        &self.state
    }

    /// Current cursor.
    pub const fn cursor(&self) -> PollCursor {
        self.state.cursor
    }

    /// The notifier in use.
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Runs one iteration without sleeping.
    ///
    /// Never returns an error: failures are logged, reported to the chat
    /// (unless identical to the last report) and returned as
    /// [`IterationOutcome::Failed`].
    pub async fn run_iteration(&mut self) -> IterationOutcome {
        let mut next_cursor = None;
        let result = self.poll(&mut next_cursor).await;

        let outcome = match result {
            Ok(Some(message)) => {
                self.state.record_success();
                IterationOutcome::Notified { message }
            }
            Ok(None) => {
                self.state.record_success();
                IterationOutcome::NoUpdates
            }
            Err(e) => {
                self.state.record_failure();
                let kind = e.kind();
                let (message, reported) = self.report_error(&e).await;
                IterationOutcome::Failed {
                    kind,
                    message,
                    reported,
                }
            }
        };

        if let Some(cursor) = next_cursor {
            debug!(from = %self.state.cursor, to = %cursor, "Advancing cursor");
            self.state.cursor = cursor;
        }

        outcome
    }

    /// Runs iterations until `shutdown` resolves.
    ///
    /// `shutdown` is checked both during an iteration and during the sleep
    /// that follows it.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            cursor = %self.state.cursor,
            interval_secs = self.interval.as_secs(),
            "Polling started"
        );

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                outcome = self.run_iteration() => {
                    debug!(?outcome, iteration = self.state.iterations, "Iteration finished");
                }
            }

            tokio::select! {
                () = &mut shutdown => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        info!(
            iterations = self.state.iterations,
            status = %self.state.status,
            uptime_secs = self.state.elapsed().num_seconds(),
            "Polling stopped"
        );
    }

    /// Steps 1-4 of an iteration. Sets `next_cursor` once the payload validates.
    async fn poll(&self, next_cursor: &mut Option<PollCursor>) -> Result<Option<String>> {
        let cursor = self.state.cursor.validate()?;
        let payload = self.source.fetch(cursor).await?;
        let update = validate_response(&payload)?;
        *next_cursor = Some(update.current_date);

        let Some(latest) = update.latest() else {
            debug!("No new homework statuses");
            return Ok(None);
        };

        let message = parse_status(&HomeworkRecord::from_value(latest)?)?;
        self.notifier.notify(&message).await?;
        Ok(Some(message))
    }

    /// Logs `err` and sends it to the chat unless it repeats the last report.
    ///
    /// Returns the notification text and whether it was delivered now.
    async fn report_error(&mut self, err: &PollerError) -> (String, bool) {
        let message = format!("{ERROR_MESSAGE_PREFIX}: {err}");
        error!(kind = %err.kind(), transient = err.is_transient(), "{message}");

        if self.state.last_error.as_deref() == Some(message.as_str()) {
            debug!("Same error already reported, not sending it again");
            return (message, false);
        }

        match self.notifier.notify(&message).await {
            Ok(()) => {
                self.state.last_error = Some(message.clone());
                (message, true)
            }
            Err(delivery) => {
                warn!(error = %delivery, "Could not deliver error notification");
                (message, false)
            }
        }
    }
}
