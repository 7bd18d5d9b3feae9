//! Study session data types.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{SessionId, UserId};
use crate::error::TrackerError;
use crate::features::activity::{AlertCounts, MetricSample};

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created, not yet started.
    Planned,
    /// Running.
    Active,
    /// Temporarily stopped.
    Paused,
    /// Finished normally. Terminal.
    Completed,
    /// Abandoned. Terminal.
    Cancelled,
}

impl SessionStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "planned" => Ok(Self::Planned),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(TrackerError::validation(
                "status",
                format!("unknown status '{other}'"),
            )),
        }
    }
}

/// Self-assessed difficulty of the material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Easy.
    Easy,
    /// Medium.
    #[default]
    Medium,
    /// Hard.
    Hard,
}

impl Difficulty {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" | "e" => Ok(Self::Easy),
            "medium" | "m" => Ok(Self::Medium),
            "hard" | "h" => Ok(Self::Hard),
            other => Err(TrackerError::validation(
                "difficulty",
                format!("unknown difficulty '{other}'"),
            )),
        }
    }
}

/// Why a break was taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    /// Taken at the student's own initiative.
    #[default]
    Manual,
    /// Planned ahead, e.g. a pomodoro boundary.
    Scheduled,
    /// Taken after a recommendation.
    Recommended,
}

impl BreakKind {
    /// Get display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Scheduled => "scheduled",
            Self::Recommended => "recommended",
        }
    }
}

impl FromStr for BreakKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "scheduled" | "pomodoro" => Ok(Self::Scheduled),
            "recommended" | "suggested" => Ok(Self::Recommended),
            other => Err(TrackerError::validation(
                "type",
                format!("unknown break type '{other}'"),
            )),
        }
    }
}

/// A break taken during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakEntry {
    /// When the break was recorded.
    pub start_time: DateTime<Utc>,
    /// Length in minutes.
    pub duration_minutes: u32,
    /// Break type.
    #[serde(rename = "type")]
    pub kind: BreakKind,
    /// Optional free-text reason.
    pub reason: Option<String>,
}

/// Running aggregates kept on the session.
///
/// During a session the three scores follow the pairwise blend of
/// [`AverageMetrics::blend`]; after completion they may be replaced by true
/// means over the recorded activities. `distraction_count` is always a sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    /// Focus score, 0..=100.
    pub focus_score: f64,
    /// Posture score, 0..=100.
    pub posture_score: f64,
    /// Eye strain level, 0..=100.
    pub eye_strain_level: f64,
    /// Total distractions.
    pub distraction_count: u32,
}

impl AverageMetrics {
    /// Fold one sample in: each score becomes `(current + sample) / 2`,
    /// distractions are added.
    ///
    /// This weights the newest sample at one half regardless of how many
    /// came before. It is not a cumulative mean.
    // TODO: replace with a cumulative mean once product confirms the intent;
    // dashboards currently read the blended value.
    pub fn blend(&mut self, sample: &MetricSample) {
        self.focus_score = (self.focus_score + sample.focus_score) / 2.0;
        self.posture_score = (self.posture_score + sample.posture_score) / 2.0;
        self.eye_strain_level = (self.eye_strain_level + sample.eye_strain_level) / 2.0;
        self.distraction_count = self
            .distraction_count
            .saturating_add(sample.distraction_count);
    }
}

/// Request to create a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    /// Owner.
    pub owner_id: UserId,
    /// Subject being studied.
    pub subject: String,
    /// Planned length in minutes.
    pub target_duration_minutes: u32,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Optional goal.
    pub goal: Option<String>,
    /// Free-form tags.
    pub tags: Vec<String>,
}

impl NewSession {
    /// A request with default difficulty and no goal or tags.
    pub fn new(owner_id: UserId, subject: impl Into<String>, target_duration_minutes: u32) -> Self {
        Self {
            owner_id,
            subject: subject.into(),
            target_duration_minutes,
            difficulty: Difficulty::default(),
            goal: None,
            tags: Vec::new(),
        }
    }
}

/// A study session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session ID.
    pub id: SessionId,
    /// Owner.
    pub owner_id: UserId,
    /// Subject being studied.
    pub subject: String,
    /// Planned length in minutes.
    pub target_duration_minutes: u32,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Optional goal.
    pub goal: Option<String>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Set on the first start.
    pub start_time: Option<DateTime<Utc>>,
    /// Set on completion.
    pub end_time: Option<DateTime<Utc>>,
    /// Start of the current pause, while paused.
    pub paused_at: Option<DateTime<Utc>>,
    /// Whole minutes spent paused so far.
    pub pause_accum_minutes: u32,
    /// Seconds spent paused so far; `pause_accum_minutes` is its floor.
    #[serde(default)]
    pub pause_accum_seconds: u32,
    /// Studied minutes, computed once at completion.
    pub actual_duration_minutes: Option<u32>,
    /// Breaks, in the order recorded.
    pub breaks: Vec<BreakEntry>,
    /// Running aggregates.
    pub average_metrics: AverageMetrics,
    /// Alert histogram.
    pub total_alerts: AlertCounts,
    /// Notes added on completion.
    pub notes: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("active".parse::<SessionStatus>().unwrap(), SessionStatus::Active);
        assert_eq!("CANCELED".parse::<SessionStatus>().unwrap(), SessionStatus::Cancelled);
        assert!("running".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!SessionStatus::Planned.is_terminal());
        assert!(!SessionStatus::Paused.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_break_kind_parse() {
        assert_eq!("pomodoro".parse::<BreakKind>().unwrap(), BreakKind::Scheduled);
        let err = "nap".parse::<BreakKind>().unwrap_err();
        assert!(matches!(err, TrackerError::Validation { field: "type", .. }));
    }

    #[test]
    fn test_blend_law() {
        let mut avg = AverageMetrics {
            focus_score: 60.0,
            posture_score: 50.0,
            eye_strain_level: 10.0,
            distraction_count: 2,
        };
        avg.blend(&MetricSample {
            focus_score: 90.0,
            posture_score: 70.0,
            eye_strain_level: 30.0,
            distraction_count: 3,
        });

        assert!((avg.focus_score - 75.0).abs() < 1e-9);
        assert!((avg.posture_score - 60.0).abs() < 1e-9);
        assert!((avg.eye_strain_level - 20.0).abs() < 1e-9);
        assert_eq!(avg.distraction_count, 5);
    }

    #[test]
    fn test_blend_overweights_latest_sample() {
        let mut avg = AverageMetrics::default();
        for _ in 0..10 {
            avg.blend(&MetricSample {
                focus_score: 100.0,
                ..MetricSample::default()
            });
        }
        avg.blend(&MetricSample::default());
        // a true mean would be ~90.9
        assert!(avg.focus_score < 50.0);
    }

    #[test]
    fn test_session_status_serializes_lowercase() {
        let json = serde_json::to_string(&SessionStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }
}
