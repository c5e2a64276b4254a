//! Homework API response validation.
//!
//! The API client hands back the decoded but unvalidated JSON payload.
//! [`validate_response`] turns it into a [`StatusUpdate`], the only shape the
//! poll loop works with.

use serde::Deserialize;
use serde_json::Value;

use crate::cursor::PollCursor;
use crate::error::{PollerError, Result};

/// The fields of a homework submission that a notification needs.
///
/// Both are optional here; [`crate::parse_status`] decides what is missing.
/// Other fields the API sends are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HomeworkRecord {
    /// Name of the homework (usually the archive name).
    #[serde(default)]
    pub homework_name: Option<String>,

    /// Review status code.
    #[serde(default)]
    pub status: Option<String>,
}

impl HomeworkRecord {
    /// Decodes a raw element of `homeworks`.
    ///
    /// # Errors
    ///
    /// Returns [`PollerError::TypeMismatch`] if `item` is not an object or
    /// `homework_name`/`status` is not a string.
    pub fn from_value(item: &Value) -> Result<Self> {
        if !item.is_object() {
            return Err(PollerError::type_mismatch(
                "homework record",
                "object",
                json_type(item),
            ));
        }
        Self::deserialize(item).map_err(|e| {
            PollerError::type_mismatch("homework record", "string fields", e.to_string())
        })
    }
}

/// A validated API response.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    /// Records in API order, untouched; index 0 is the most recent.
    pub homeworks: Vec<Value>,
    /// Cursor for the next query.
    pub current_date: PollCursor,
}

impl StatusUpdate {
    /// The most recent record, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&Value> {
        self.homeworks.first()
    }

    /// Returns `true` if the response carried no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.homeworks.is_empty()
    }
}

/// Validates a decoded API payload.
///
/// Only the envelope is checked. Records are returned as sent and decoded
/// one at a time by [`HomeworkRecord::from_value`].
///
/// # Errors
///
/// - [`PollerError::TypeMismatch`] if the payload is not an object,
///   `homeworks` is not an array or `current_date` is not an integer.
/// - [`PollerError::MissingField`] if `current_date` or `homeworks` is absent.
pub fn validate_response(payload: &Value) -> Result<StatusUpdate> {
    let Value::Object(fields) = payload else {
        return Err(PollerError::type_mismatch(
            "response",
            "object",
            json_type(payload),
        ));
    };

    let current_date = fields
        .get("current_date")
        .ok_or_else(|| PollerError::missing_field("current_date", "response"))?;
    let homeworks = fields
        .get("homeworks")
        .ok_or_else(|| PollerError::missing_field("homeworks", "response"))?;

    let Value::Array(items) = homeworks else {
        return Err(PollerError::type_mismatch(
            "homeworks",
            "array",
            json_type(homeworks),
        ));
    };
    let current_date = current_date.as_i64().ok_or_else(|| {
        PollerError::type_mismatch("current_date", "integer", json_type(current_date))
    })?;

    Ok(StatusUpdate {
        homeworks: items.clone(),
        current_date: PollCursor::from_timestamp(current_date),
    })
}

/// Human-readable JSON type name for error messages.
const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
