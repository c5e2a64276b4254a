//! Polling cursor: the lower bound of the next query window.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{PollerError, Result};

/// Unix timestamp (seconds) passed to the API as `from_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollCursor(i64);

impl PollCursor {
    /// Wraps a raw timestamp without checking it; see [`PollCursor::validate`].
    #[must_use]
    pub const fn from_timestamp(timestamp: i64) -> Self {
        Self(timestamp)
    }

    /// A cursor at the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    /// Returns the raw timestamp.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Checks that the cursor is a usable timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`PollerError::InvalidCursor`] for negative values.
    pub fn validate(self) -> Result<Self> {
        if self.0 < 0 {
            return Err(PollerError::InvalidCursor { value: self.0 });
        }
        Ok(self)
    }
}

impl fmt::Display for PollCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
