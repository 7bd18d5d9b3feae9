//! Users and their cumulative study statistics.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::UserId;
use crate::error::TrackerError;
use crate::features::session::Session;

/// Owner of study sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// When the user was added.
    pub created_at: DateTime<Utc>,
    /// Cumulative statistics.
    pub stats: UserStats,
}

impl User {
    /// Create a user with empty statistics.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Validation` if the name is blank.
    pub fn new(name: &str, now: DateTime<Utc>) -> Result<Self, TrackerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::validation("name", "must not be empty"));
        }
        Ok(Self {
            id: UserId::new(),
            name: name.to_string(),
            created_at: now,
            stats: UserStats::default(),
        })
    }
}

/// Statistics accumulated over completed sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    /// Sum of actual durations.
    pub total_study_minutes: u64,
    /// Completed sessions.
    pub total_sessions: u32,
    /// Mean of per-session focus averages.
    pub average_focus_score: f64,
    /// Mean of per-session posture averages.
    pub average_posture_score: f64,
    /// Consecutive calendar days with a completed session.
    pub streak_days: u32,
    /// Day of the most recent completion.
    pub last_study_date: Option<NaiveDate>,
}

/// Advance a streak for a completion on `completed_on`.
///
/// Same day leaves the count alone, the following day extends it, anything
/// else (a gap, a first session, or a date before the last one) restarts
/// it at 1.
#[must_use]
pub fn user_streak(previous: &UserStats, completed_on: NaiveDate) -> UserStats {
    let streak_days = match previous.last_study_date {
        Some(last) if last == completed_on => previous.streak_days.max(1),
        Some(last) if last + Duration::days(1) == completed_on => {
            previous.streak_days.saturating_add(1)
        }
        _ => 1,
    };

    UserStats {
        streak_days,
        last_study_date: Some(completed_on),
        ..previous.clone()
    }
}

/// Fold a completed session into the statistics.
///
/// Averages are running means over completed sessions, then the streak is
/// advanced for `completed_on`.
#[must_use]
pub fn record_session(previous: &UserStats, session: &Session, completed_on: NaiveDate) -> UserStats {
    let total_sessions = previous.total_sessions.saturating_add(1);
    let n = f64::from(total_sessions);
    let prior = f64::from(previous.total_sessions);
    let metrics = &session.average_metrics;

    let updated = UserStats {
        total_study_minutes: previous
            .total_study_minutes
            .saturating_add(u64::from(session.actual_duration_minutes.unwrap_or(0))),
        total_sessions,
        average_focus_score: previous.average_focus_score.mul_add(prior, metrics.focus_score) / n,
        average_posture_score: previous
            .average_posture_score
            .mul_add(prior, metrics.posture_score)
            / n,
        ..previous.clone()
    };

    user_streak(&updated, completed_on)
}
