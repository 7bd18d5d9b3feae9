//! JSON output formatting for studytrack.

use serde::Serialize;
use serde_json::json;

use crate::error::TrackerError;
use crate::features::activity::{SessionAnalytics, TimelinePoint};
use crate::features::session::Session;

/// Format sessions as JSON
///
/// # Errors
///
/// Returns `TrackerError::Json` if serialization fails.
pub fn format_sessions_json(sessions: &[Session]) -> Result<String, TrackerError> {
    let output = json!({
        "count": sessions.len(),
        "items": sessions
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format analytics and timeline as JSON. Missing analytics serialize as
/// `null`.
///
/// # Errors
///
/// Returns `TrackerError::Json` if serialization fails.
pub fn format_analytics_json(
    analytics: Option<&SessionAnalytics>,
    points: &[TimelinePoint],
) -> Result<String, TrackerError> {
    let output = json!({
        "analytics": analytics,
        "timeline": points
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Serialize any value to pretty JSON
///
/// # Errors
///
/// Returns `TrackerError::Json` if serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, TrackerError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::core::UserId;
    use crate::features::session::NewSession;
    use chrono::{TimeZone, Utc};

    fn session(subject: &str) -> Session {
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap();
        Session::create(NewSession::new(UserId::new(), subject, 30), &SessionConfig::default(), now)
            .unwrap()
    }

    #[test]
    fn test_format_sessions_json() {
        let result = format_sessions_json(&[session("Maths"), session("Art")]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(parsed["count"], 2);
        assert_eq!(parsed["items"][0]["subject"], "Maths");
        assert_eq!(parsed["items"][0]["status"], "planned");
    }

    #[test]
    fn test_format_analytics_json_without_data() {
        let result = format_analytics_json(None, &[]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert!(parsed["analytics"].is_null());
        assert_eq!(parsed["timeline"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_to_json_session_fields() {
        let result = to_json(&session("Maths")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(parsed["target_duration_minutes"], 30);
        assert_eq!(parsed["average_metrics"]["focus_score"], 0.0);
        assert!(parsed["end_time"].is_null());
    }
}
