//! Activity data types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{ActivityId, SessionId};
use crate::error::TrackerError;

/// Category of an alert raised by a metric sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Focus score dropped.
    Focus,
    /// Posture score dropped.
    Posture,
    /// Eye strain rose.
    EyeStrain,
    /// No face in view.
    Detection,
    /// Several distractions in one sample.
    Distraction,
}

impl AlertKind {
    /// Get display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Focus => "Focus",
            Self::Posture => "Posture",
            Self::EyeStrain => "Eye strain",
            Self::Detection => "Detection",
            Self::Distraction => "Distraction",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Worth a nudge.
    Medium,
    /// Needs attention now.
    High,
}

/// An alert generated when a sample crosses a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert category.
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// Severity.
    pub level: AlertLevel,
    /// Message shown to the student.
    pub message: String,
    /// Short machine-readable suggested action.
    pub action: String,
}

/// Histogram of alert occurrences by kind.
pub type AlertCounts = BTreeMap<AlertKind, u32>;

/// Head orientation in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    /// Up/down tilt.
    pub pitch: f64,
    /// Left/right turn.
    pub yaw: f64,
    /// Sideways tilt.
    pub roll: f64,
}

/// Normalised gaze position; `(0.5, 0.5)` is the screen centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeGaze {
    /// Horizontal position, 0..1.
    pub x: f64,
    /// Vertical position, 0..1.
    pub y: f64,
    /// Whether the gaze falls on the screen at all.
    pub on_screen: bool,
}

impl Default for EyeGaze {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            on_screen: true,
        }
    }
}

/// The four scalar metrics folded into a session's running aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Focus score, 0..=100.
    pub focus_score: f64,
    /// Posture score, 0..=100.
    pub posture_score: f64,
    /// Eye strain level, 0..=100.
    pub eye_strain_level: f64,
    /// Distractions observed in this sample.
    pub distraction_count: u32,
}

impl MetricSample {
    /// Check that every score lies in `[0, 100]`.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), TrackerError> {
        let scores = [
            ("focus_score", self.focus_score),
            ("posture_score", self.posture_score),
            ("eye_strain_level", self.eye_strain_level),
        ];
        for (field, value) in scores {
            if !(0.0..=100.0).contains(&value) {
                return Err(TrackerError::validation(
                    field,
                    format!("{value} is outside 0..=100"),
                ));
            }
        }
        Ok(())
    }
}

/// Full metric snapshot stored with an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetrics {
    /// Focus score, 0..=100.
    pub focus_score: f64,
    /// Posture score, 0..=100.
    pub posture_score: f64,
    /// Eye strain level, 0..=100.
    pub eye_strain_level: f64,
    /// Distractions observed in this sample.
    pub distraction_count: u32,
    /// Whether a face was in view.
    pub face_detected: bool,
    /// Head orientation, when a face was found.
    pub head_pose: Option<HeadPose>,
    /// Gaze, when a face was found.
    pub eye_gaze: Option<EyeGaze>,
    /// Dominant emotion, when a face was found.
    pub emotion: Option<String>,
}

impl ActivityMetrics {
    /// The scalar part used for running aggregates.
    #[must_use]
    pub const fn sample(&self) -> MetricSample {
        MetricSample {
            focus_score: self.focus_score,
            posture_score: self.posture_score,
            eye_strain_level: self.eye_strain_level,
            distraction_count: self.distraction_count,
        }
    }
}

/// A timestamped metric sample captured during a session. Immutable once
/// stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity ID.
    pub id: ActivityId,
    /// Owning session.
    pub session_id: SessionId,
    /// When the sample was taken.
    pub timestamp: DateTime<Utc>,
    /// Metric snapshot.
    pub metrics: ActivityMetrics,
    /// Alerts raised by this sample.
    pub alerts: Vec<Alert>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_validate_accepts_bounds() {
        let sample = MetricSample {
            focus_score: 0.0,
            posture_score: 100.0,
            eye_strain_level: 50.0,
            distraction_count: 7,
        };
        assert!(sample.validate().is_ok());
    }

    #[test]
    fn test_sample_validate_rejects_out_of_range() {
        let sample = MetricSample {
            focus_score: 50.0,
            posture_score: 101.0,
            ..MetricSample::default()
        };
        let err = sample.validate().unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Validation {
                field: "posture_score",
                ..
            }
        ));
    }

    #[test]
    fn test_sample_validate_rejects_nan() {
        let sample = MetricSample {
            focus_score: f64::NAN,
            ..MetricSample::default()
        };
        assert!(sample.validate().is_err());
    }

    #[test]
    fn test_alert_kind_serializes_snake_case() {
        let json = serde_json::to_string(&AlertKind::EyeStrain).unwrap();
        assert_eq!(json, "\"eye_strain\"");
    }

    #[test]
    fn test_alert_counts_serialize_as_object() {
        let mut counts = AlertCounts::new();
        counts.insert(AlertKind::Focus, 2);
        counts.insert(AlertKind::Detection, 1);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"focus":2,"detection":1}"#);
    }
}
