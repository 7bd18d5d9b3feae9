//! Error types for studytrack.
//!
//! Every failure in the crate is reported as a [`TrackerError`]. None of them
//! are retried: they are deterministic functions of the stored state plus the
//! caller's input.

use thiserror::Error;

use crate::features::session::SessionStatus;

/// Errors returned by studytrack operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The requested lifecycle action is not legal from the current status.
    #[error("cannot {action} a session that is {from}")]
    InvalidTransition {
        /// The attempted action (`start`, `pause`, ...).
        action: &'static str,
        /// Status the session was in when the action was attempted.
        from: SessionStatus,
    },

    /// Malformed caller input.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable reason.
        message: String,
    },

    /// A referenced session, activity or user does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The persistence layer failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Configuration could not be read, parsed or written.
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrackerError {
    /// Shorthand for building a [`TrackerError::Validation`].
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Whether the error is caused by the caller (bad state or bad input)
    /// rather than by the environment.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. } | Self::Validation { .. } | Self::NotFound(_)
        )
    }
}

impl From<rusqlite::Error> for TrackerError {
    fn from(e: rusqlite::Error) -> Self {
        Self::StorageUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = TrackerError::InvalidTransition {
            action: "pause",
            from: SessionStatus::Planned,
        };
        assert_eq!(err.to_string(), "cannot pause a session that is planned");
        assert!(err.is_user_error());
    }

    #[test]
    fn test_validation_message() {
        let err = TrackerError::validation("duration_minutes", "must be between 1 and 60");
        assert_eq!(
            err.to_string(),
            "invalid duration_minutes: must be between 1 and 60"
        );
    }

    #[test]
    fn test_storage_error_is_not_user_error() {
        let err = TrackerError::StorageUnavailable("disk full".to_string());
        assert!(!err.is_user_error());
    }
}
