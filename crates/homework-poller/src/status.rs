//! Review status codes and their chat messages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PollerError, Result};
use crate::response::HomeworkRecord;

/// Review outcome reported by the homework API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeworkStatus {
    /// The reviewer accepted the work.
    Approved,
    /// The work has been picked up for review.
    Reviewing,
    /// The reviewer returned the work with remarks.
    Rejected,
}

impl HomeworkStatus {
    /// Every known status.
    pub const ALL: [Self; 3] = [Self::Approved, Self::Reviewing, Self::Rejected];

    /// The status code as sent by the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Reviewing => "reviewing",
            Self::Rejected => "rejected",
        }
    }

    /// Localized verdict shown to the student.
    #[must_use]
    pub const fn verdict(self) -> &'static str {
        match self {
            Self::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Self::Reviewing => "Работа взята на проверку ревьюером.",
            Self::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl FromStr for HomeworkStatus {
    type Err = PollerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| PollerError::unknown_status(s))
    }
}

impl fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the status-change message for a homework record.
///
/// # Errors
///
/// Returns [`PollerError::MissingField`] if `homework_name` or `status` is
/// absent, and [`PollerError::UnknownStatus`] if `status` is not one of the
/// known codes.
pub fn parse_status(record: &HomeworkRecord) -> Result<String> {
    let name = record
        .homework_name
        .as_deref()
        .ok_or_else(|| PollerError::missing_field("homework_name", "homework record"))?;
    let status: HomeworkStatus = record
        .status
        .as_deref()
        .ok_or_else(|| PollerError::missing_field("status", "homework record"))?
        .parse()?;

    Ok(format!(
        "Изменился статус проверки работы \"{name}\". {}",
        status.verdict()
    ))
}
