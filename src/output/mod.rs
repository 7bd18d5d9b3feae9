//! Output formatting for studytrack.
//!
//! Each formatter has a pretty (colored, human-readable) and a JSON form;
//! the functions here pick one based on [`OutputFormat`].

mod json;
mod pretty;

use chrono::{DateTime, Utc};

use crate::cli::args::OutputFormat;
use crate::error::TrackerError;
use crate::features::activity::{SessionAnalytics, TimelinePoint};
use crate::features::session::{RecordedActivity, Session};
use crate::features::stats::{StudyReport, User};

pub use json::*;
pub use pretty::*;

/// Format a single session based on output format
///
/// # Errors
///
/// Returns `TrackerError::Json` if JSON serialization fails.
pub fn format_session(
    session: &Session,
    now: DateTime<Utc>,
    format: OutputFormat,
) -> Result<String, TrackerError> {
    match format {
        OutputFormat::Pretty => Ok(format_session_pretty(session, now)),
        OutputFormat::Json => to_json(session),
    }
}

/// Format sessions based on output format
///
/// # Errors
///
/// Returns `TrackerError::Json` if JSON serialization fails.
pub fn format_sessions(sessions: &[Session], format: OutputFormat) -> Result<String, TrackerError> {
    match format {
        OutputFormat::Pretty => Ok(format_sessions_pretty(sessions)),
        OutputFormat::Json => format_sessions_json(sessions),
    }
}

/// Format a user based on output format
///
/// # Errors
///
/// Returns `TrackerError::Json` if JSON serialization fails.
pub fn format_user(user: &User, format: OutputFormat) -> Result<String, TrackerError> {
    match format {
        OutputFormat::Pretty => Ok(format_user_pretty(user)),
        OutputFormat::Json => to_json(user),
    }
}

/// Format analytics based on output format
///
/// # Errors
///
/// Returns `TrackerError::Json` if JSON serialization fails.
pub fn format_analytics(
    analytics: Option<&SessionAnalytics>,
    points: &[TimelinePoint],
    format: OutputFormat,
) -> Result<String, TrackerError> {
    match format {
        OutputFormat::Pretty => Ok(format_analytics_pretty(analytics, points)),
        OutputFormat::Json => format_analytics_json(analytics, points),
    }
}

/// Format simulated observations based on output format
///
/// # Errors
///
/// Returns `TrackerError::Json` if JSON serialization fails.
pub fn format_recorded(
    recorded: &[RecordedActivity],
    format: OutputFormat,
) -> Result<String, TrackerError> {
    match format {
        OutputFormat::Pretty => Ok(format_recorded_pretty(recorded)),
        OutputFormat::Json => to_json(&recorded),
    }
}

/// Format a study report based on output format
///
/// # Errors
///
/// Returns `TrackerError::Json` if JSON serialization fails.
pub fn format_report(report: &StudyReport, format: OutputFormat) -> Result<String, TrackerError> {
    match format {
        OutputFormat::Pretty => Ok(format_report_pretty(report)),
        OutputFormat::Json => to_json(report),
    }
}
