//! Scoring of raw observations into activity metrics.
//!
//! An [`Observation`] is what a face-analysis process reports for one frame.
//! The [`Analyzer`] turns it into [`ActivityMetrics`], then derives alerts
//! and break recommendations from the metrics and the session's elapsed
//! time. All functions here are pure.

use serde::{Deserialize, Serialize};

use super::model::{ActivityMetrics, Alert, AlertKind, AlertLevel, EyeGaze, HeadPose};
use crate::config::AnalysisConfig;

/// Emotion weights, each 0..1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Emotions {
    /// Neutral expression.
    pub neutral: f64,
    /// Concentrated expression.
    pub focused: f64,
    /// Tired expression.
    pub tired: f64,
    /// Distracted expression.
    pub distracted: f64,
}

impl Emotions {
    /// The dominant emotion, or `"neutral"` when nothing stands out.
    #[must_use]
    pub fn primary(&self) -> &'static str {
        let candidates = [
            ("neutral", self.neutral),
            ("focused", self.focused),
            ("tired", self.tired),
            ("distracted", self.distracted),
        ];

        let (name, weight) = candidates
            .into_iter()
            .fold(("neutral", 0.0), |best, c| if c.1 > best.1 { c } else { best });

        if weight > 0.3 {
            name
        } else {
            "neutral"
        }
    }
}

/// Frame quality as reported by the capture pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageQuality {
    /// Brightness, 0..1.
    pub brightness: f64,
    /// Sharpness, 0..1.
    pub sharpness: f64,
    /// Camera angle to the face, degrees.
    pub angle: f64,
}

/// One raw frame analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Whether a face was found.
    pub face_detected: bool,
    /// Detector confidence, 0..1.
    pub confidence: f64,
    /// Head orientation.
    pub head_pose: Option<HeadPose>,
    /// Gaze.
    pub eye_gaze: Option<EyeGaze>,
    /// Emotion weights.
    pub emotions: Option<Emotions>,
    /// Frame quality.
    pub quality: Option<ImageQuality>,
    /// Blinks per minute.
    pub blink_rate: f64,
}

impl Observation {
    /// An observation with no face in view.
    #[must_use]
    pub const fn no_face() -> Self {
        Self {
            face_detected: false,
            confidence: 0.0,
            head_pose: None,
            eye_gaze: None,
            emotions: None,
            quality: None,
            blink_rate: 0.0,
        }
    }
}

/// Kind of break or habit recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Long break after an extended session.
    Break,
    /// Short break at a pomodoro boundary.
    PomodoroBreak,
    /// Rest the eyes.
    EyeRest,
    /// Stretch for posture.
    PostureExercise,
    /// Tidy the environment.
    Environment,
}

/// Recommendation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Suggested.
    Medium,
    /// Strongly suggested.
    High,
}

/// A suggestion sent to the student alongside a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// What kind of suggestion this is.
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    /// How strongly it is suggested.
    pub priority: Priority,
    /// Why it is suggested.
    pub message: String,
    /// Suggested length in minutes (0 when not a break).
    pub duration_minutes: u32,
    /// What to do.
    pub activity: String,
}

/// Result of analysing one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Scored metrics.
    pub metrics: ActivityMetrics,
    /// Alerts raised.
    pub alerts: Vec<Alert>,
    /// Recommendations.
    pub recommendations: Vec<Recommendation>,
}

/// Turns observations into metrics, alerts and recommendations.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    /// Create an analyzer with the given thresholds.
    #[must_use]
    pub const fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Analyse an observation taken `session_minutes` into a session.
    #[must_use]
    pub fn analyze(&self, observation: &Observation, session_minutes: i64) -> Analysis {
        let metrics = ActivityMetrics {
            focus_score: focus_score(observation),
            posture_score: posture_score(observation),
            eye_strain_level: eye_strain_level(observation, session_minutes),
            distraction_count: distraction_count(observation),
            face_detected: observation.face_detected,
            head_pose: observation.head_pose,
            eye_gaze: observation.eye_gaze,
            emotion: observation.emotions.map(|e| e.primary().to_string()),
        };

        let alerts = self.alerts(&metrics);
        let recommendations = self.recommendations(&metrics, session_minutes);

        Analysis {
            metrics,
            alerts,
            recommendations,
        }
    }

    /// Alerts for a metric snapshot.
    #[must_use]
    pub fn alerts(&self, metrics: &ActivityMetrics) -> Vec<Alert> {
        let c = &self.config;
        let mut alerts = Vec::new();

        if metrics.focus_score < c.focus_high {
            alerts.push(alert(
                AlertKind::Focus,
                AlertLevel::High,
                "Very low focus detected. Consider taking a break.",
                "break",
            ));
        } else if metrics.focus_score < c.focus_medium {
            alerts.push(alert(
                AlertKind::Focus,
                AlertLevel::Medium,
                "Focus level is declining. Try to eliminate distractions.",
                "refocus",
            ));
        }

        if metrics.posture_score < c.posture_high {
            alerts.push(alert(
                AlertKind::Posture,
                AlertLevel::High,
                "Poor posture detected. Adjust your sitting position.",
                "adjust_posture",
            ));
        } else if metrics.posture_score < c.posture_medium {
            alerts.push(alert(
                AlertKind::Posture,
                AlertLevel::Medium,
                "Slouching detected. Sit up straight.",
                "sit_straight",
            ));
        }

        if metrics.eye_strain_level > c.eye_strain_high {
            alerts.push(alert(
                AlertKind::EyeStrain,
                AlertLevel::High,
                "High eye strain. Take a break and rest your eyes.",
                "eye_break",
            ));
        } else if metrics.eye_strain_level > c.eye_strain_medium {
            alerts.push(alert(
                AlertKind::EyeStrain,
                AlertLevel::Medium,
                "Moderate eye strain. Look away from screen periodically.",
                "look_away",
            ));
        }

        if !metrics.face_detected {
            alerts.push(alert(
                AlertKind::Detection,
                AlertLevel::Medium,
                "Face not detected. Please stay in view of the camera.",
                "adjust_camera",
            ));
        }

        if metrics.distraction_count >= c.distraction_alert {
            alerts.push(alert(
                AlertKind::Distraction,
                AlertLevel::High,
                "Multiple distractions detected. Try to focus on your study material.",
                "eliminate_distractions",
            ));
        }

        alerts
    }

    /// Recommendations for a metric snapshot taken `session_minutes` in.
    #[must_use]
    pub fn recommendations(
        &self,
        metrics: &ActivityMetrics,
        session_minutes: i64,
    ) -> Vec<Recommendation> {
        let c = &self.config;
        let mut out = Vec::new();

        if session_minutes > c.long_session_minutes {
            out.push(recommendation(
                RecommendationKind::Break,
                Priority::High,
                &format!(
                    "You've been studying for over {} minutes. Take a longer break.",
                    c.long_session_minutes
                ),
                15,
                "Take a walk and get some fresh air",
            ));
        } else if session_minutes > 0 && session_minutes % c.pomodoro_minutes == 0 {
            out.push(recommendation(
                RecommendationKind::PomodoroBreak,
                Priority::Medium,
                "Time for a Pomodoro break!",
                5,
                "Stand up, stretch, and hydrate",
            ));
        }

        if metrics.focus_score < 60.0 && metrics.eye_strain_level > 50.0 {
            out.push(recommendation(
                RecommendationKind::EyeRest,
                Priority::High,
                "Low focus and eye strain detected",
                10,
                "Close your eyes and practice deep breathing",
            ));
        }

        if metrics.posture_score < 50.0 {
            out.push(recommendation(
                RecommendationKind::PostureExercise,
                Priority::Medium,
                "Poor posture detected",
                3,
                "Do neck rolls and shoulder shrugs",
            ));
        }

        if metrics.distraction_count > 2 {
            out.push(recommendation(
                RecommendationKind::Environment,
                Priority::Medium,
                "High distraction level",
                0,
                "Clear your workspace and minimize distractions",
            ));
        }

        out
    }
}

fn alert(kind: AlertKind, level: AlertLevel, message: &str, action: &str) -> Alert {
    Alert {
        kind,
        level,
        message: message.to_string(),
        action: action.to_string(),
    }
}

fn recommendation(
    kind: RecommendationKind,
    priority: Priority,
    message: &str,
    duration_minutes: u32,
    activity: &str,
) -> Recommendation {
    Recommendation {
        kind,
        priority,
        message: message.to_string(),
        duration_minutes,
        activity: activity.to_string(),
    }
}

fn round_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0).round()
}

/// Focus score for an observation, 0..=100.
#[must_use]
pub fn focus_score(obs: &Observation) -> f64 {
    if !obs.face_detected {
        return 0.0;
    }

    let pose = obs.head_pose.unwrap_or_default();
    let head_pose_score = (100.0 - (pose.pitch.abs() + pose.yaw.abs() + pose.roll.abs())).max(0.0);
    let mut score = (70.0 + head_pose_score) / 2.0;

    if let Some(gaze) = obs.eye_gaze {
        if gaze.on_screen {
            let gaze_score = 100.0 - ((gaze.x - 0.5).abs() + (gaze.y - 0.5).abs()) * 200.0;
            score = (score + gaze_score.max(0.0)) / 2.0;
        } else {
            score *= 0.5;
        }
    }

    if let Some(e) = obs.emotions {
        let emotion_score = e.focused * 100.0 + e.neutral * 80.0 - e.distracted * 50.0;
        score = (score + emotion_score.max(0.0)) / 2.0;
    }

    round_score(score)
}

/// Posture score for an observation, 0..=100.
#[must_use]
pub fn posture_score(obs: &Observation) -> f64 {
    if !obs.face_detected {
        return 0.0;
    }

    let pose = obs.head_pose.unwrap_or_default();
    let mut score = 80.0;

    if pose.pitch.abs() > 15.0 {
        score -= pose.pitch.abs() * 2.0;
    }
    if pose.yaw.abs() > 20.0 {
        score -= pose.yaw.abs() * 1.5;
    }
    if pose.roll.abs() > 10.0 {
        score -= pose.roll.abs() * 3.0;
    }

    if let Some(q) = obs.quality {
        let angle_score = (100.0 - q.angle * 2.0).max(0.0);
        score = (score + angle_score) / 2.0;
    }

    round_score(score)
}

/// Eye strain for an observation taken `session_minutes` in, 0..=100.
#[must_use]
pub fn eye_strain_level(obs: &Observation, session_minutes: i64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let minutes = session_minutes.max(0) as f64;
    let mut strain = (minutes / 60.0 * 10.0).min(40.0);

    if !obs.face_detected {
        return round_score(strain);
    }

    if obs.blink_rate < 12.0 {
        strain += 20.0;
    }
    if obs.blink_rate > 30.0 {
        strain += 10.0;
    }

    if obs.eye_gaze.is_some_and(|g| !g.on_screen) {
        strain += 5.0;
    }

    if let Some(q) = obs.quality {
        if q.brightness < 0.4 {
            strain += 15.0;
        }
        if q.brightness > 0.9 {
            strain += 10.0;
        }
    }

    round_score(strain)
}

/// Number of distraction signals in an observation.
#[must_use]
pub fn distraction_count(obs: &Observation) -> u32 {
    let mut count = 0;

    if !obs.face_detected {
        count += 1;
    }
    if obs.eye_gaze.is_some_and(|g| !g.on_screen) {
        count += 1;
    }
    if let Some(pose) = obs.head_pose {
        if pose.yaw.abs() > 30.0 {
            count += 1;
        }
        if pose.pitch.abs() > 20.0 {
            count += 1;
        }
    }
    if obs.emotions.is_some_and(|e| e.distracted > 0.5) {
        count += 1;
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attentive() -> Observation {
        Observation {
            face_detected: true,
            confidence: 0.95,
            head_pose: Some(HeadPose::default()),
            eye_gaze: Some(EyeGaze {
                x: 0.5,
                y: 0.5,
                on_screen: true,
            }),
            emotions: None,
            quality: None,
            blink_rate: 18.0,
        }
    }

    #[test]
    fn test_focus_score_no_face_is_zero() {
        assert!(focus_score(&Observation::no_face()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_focus_score_attentive() {
        // (70 + 100) / 2 = 85, then (85 + 100) / 2 = 92.5 -> 93
        assert!((focus_score(&attentive()) - 93.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_focus_score_off_screen_halves() {
        let mut obs = attentive();
        obs.eye_gaze = Some(EyeGaze {
            x: 0.5,
            y: 0.5,
            on_screen: false,
        });
        // 85 * 0.5 = 42.5 -> 43 (round half away from zero)
        assert!((focus_score(&obs) - 43.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_posture_score_penalises_tilt() {
        let mut obs = attentive();
        obs.head_pose = Some(HeadPose {
            pitch: 20.0,
            yaw: 0.0,
            roll: 0.0,
        });
        // 80 - 40
        assert!((posture_score(&obs) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_posture_score_clamped_at_zero() {
        let mut obs = attentive();
        obs.head_pose = Some(HeadPose {
            pitch: 40.0,
            yaw: 40.0,
            roll: 40.0,
        });
        assert!(posture_score(&obs).abs() < f64::EPSILON);
    }

    #[test]
    fn test_eye_strain_grows_with_duration_and_caps() {
        let obs = attentive();
        assert!((eye_strain_level(&obs, 60) - 10.0).abs() < f64::EPSILON);
        assert!((eye_strain_level(&obs, 600) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_eye_strain_penalties() {
        let mut obs = attentive();
        obs.blink_rate = 8.0;
        obs.quality = Some(ImageQuality {
            brightness: 0.2,
            sharpness: 0.8,
            angle: 0.0,
        });
        // 0 + 20 (low blink) + 15 (dim)
        assert!((eye_strain_level(&obs, 0) - 35.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distraction_count() {
        assert_eq!(distraction_count(&attentive()), 0);
        assert_eq!(distraction_count(&Observation::no_face()), 1);

        let mut obs = attentive();
        obs.head_pose = Some(HeadPose {
            pitch: 25.0,
            yaw: 35.0,
            roll: 0.0,
        });
        obs.eye_gaze = Some(EyeGaze {
            x: 0.9,
            y: 0.1,
            on_screen: false,
        });
        obs.emotions = Some(Emotions {
            distracted: 0.8,
            ..Emotions::default()
        });
        assert_eq!(distraction_count(&obs), 4);
    }

    #[test]
    fn test_primary_emotion() {
        let e = Emotions {
            neutral: 0.2,
            focused: 0.7,
            tired: 0.1,
            distracted: 0.0,
        };
        assert_eq!(e.primary(), "focused");
        assert_eq!(Emotions::default().primary(), "neutral");
    }

    #[test]
    fn test_alerts_for_missing_face() {
        let analyzer = Analyzer::default();
        let analysis = analyzer.analyze(&Observation::no_face(), 0);

        let kinds: Vec<_> = analysis.alerts.iter().map(|a| a.kind).collect();
        assert!(kinds.contains(&AlertKind::Focus));
        assert!(kinds.contains(&AlertKind::Posture));
        assert!(kinds.contains(&AlertKind::Detection));
        assert!(!kinds.contains(&AlertKind::EyeStrain));
        assert_eq!(analysis.metrics.emotion, None);
    }

    #[test]
    fn test_attentive_sample_raises_no_alerts() {
        let analyzer = Analyzer::default();
        let analysis = analyzer.analyze(&attentive(), 10);
        assert!(analysis.alerts.is_empty());
    }

    #[test]
    fn test_pomodoro_recommendation() {
        let analyzer = Analyzer::default();
        let analysis = analyzer.analyze(&attentive(), 50);
        assert!(analysis
            .recommendations
            .iter()
            .any(|r| r.kind == RecommendationKind::PomodoroBreak));
    }

    #[test]
    fn test_long_session_recommendation() {
        let analyzer = Analyzer::default();
        let analysis = analyzer.analyze(&attentive(), 95);
        let first = &analysis.recommendations[0];
        assert_eq!(first.kind, RecommendationKind::Break);
        assert_eq!(first.duration_minutes, 15);
    }

    #[test]
    fn test_thresholds_come_from_config() {
        let config = AnalysisConfig {
            distraction_alert: 1,
            ..AnalysisConfig::default()
        };
        let analyzer = Analyzer::new(config);
        let mut obs = attentive();
        obs.eye_gaze = Some(EyeGaze {
            x: 0.5,
            y: 0.5,
            on_screen: false,
        });

        let analysis = analyzer.analyze(&obs, 0);
        assert!(analysis
            .alerts
            .iter()
            .any(|a| a.kind == AlertKind::Distraction));
    }
}
