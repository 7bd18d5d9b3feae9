//! Session analytics command.

use crate::cli::args::OutputFormat;
use crate::core::SessionId;
use crate::error::TrackerError;
use crate::features::session::{NotificationSink, SessionManager, SessionStore};
use crate::output::format_analytics;

/// Show the aggregate and timeline of a session's activities.
///
/// # Errors
///
/// Returns `TrackerError::NotFound` for an unknown session.
pub fn report<S: SessionStore, N: NotificationSink>(
    manager: &SessionManager<S, N>,
    session: SessionId,
    points: usize,
    format: OutputFormat,
) -> Result<String, TrackerError> {
    let analytics = manager.analytics(session)?;
    let timeline = manager.timeline(session, points)?;
    format_analytics(analytics.as_ref(), &timeline, format)
}
