//! End-of-session aggregation over a full activity list.
//!
//! Unlike the running blend kept on the session, these are true arithmetic
//! means.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{Activity, AlertCounts};
use crate::features::session::AverageMetrics;

/// First and last sample timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Earliest sample.
    pub start: DateTime<Utc>,
    /// Latest sample.
    pub end: DateTime<Utc>,
}

/// Aggregate view of a session's activities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalytics {
    /// Number of samples.
    pub total_data_points: usize,
    /// Mean scores and summed distractions.
    pub average_metrics: AverageMetrics,
    /// Alert histogram.
    pub total_alerts: AlertCounts,
    /// Percentage of samples with a face in view, 0..=100.
    pub face_detection_rate: f64,
    /// Span of the samples.
    pub time_range: TimeRange,
}

/// One bucket of a downsampled metric timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    /// Timestamp of the first sample in the bucket.
    pub timestamp: DateTime<Utc>,
    /// Mean focus in the bucket.
    pub focus_score: f64,
    /// Mean posture in the bucket.
    pub posture_score: f64,
    /// Mean eye strain in the bucket.
    pub eye_strain_level: f64,
    /// Whether most samples in the bucket saw a face.
    pub face_detected: bool,
}

/// Aggregate a session's activities.
///
/// Returns `None` when there is no data. The input need not be sorted.
#[must_use]
pub fn dashboard_aggregate(activities: &[Activity]) -> Option<SessionAnalytics> {
    let first = activities.iter().min_by_key(|a| a.timestamp)?;
    let last = activities.iter().max_by_key(|a| a.timestamp)?;

    let (mean, detected) = means(activities);
    let distraction_count = activities.iter().map(|a| a.metrics.distraction_count).sum();

    let mut total_alerts = AlertCounts::new();
    for alert in activities.iter().flat_map(|a| &a.alerts) {
        *total_alerts.entry(alert.kind).or_default() += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let face_detection_rate = detected as f64 / activities.len() as f64 * 100.0;

    Some(SessionAnalytics {
        total_data_points: activities.len(),
        average_metrics: AverageMetrics {
            distraction_count,
            ..mean
        },
        total_alerts,
        face_detection_rate,
        time_range: TimeRange {
            start: first.timestamp,
            end: last.timestamp,
        },
    })
}

/// Downsample activities into at most `max_points` buckets, in time order.
#[must_use]
pub fn timeline(activities: &[Activity], max_points: usize) -> Vec<TimelinePoint> {
    if activities.is_empty() || max_points == 0 {
        return Vec::new();
    }

    let mut sorted: Vec<&Activity> = activities.iter().collect();
    sorted.sort_by_key(|a| a.timestamp);

    let bucket = sorted.len().div_ceil(max_points).max(1);

    sorted
        .chunks(bucket)
        .map(|chunk| {
            let (mean, detected) = means(chunk.iter().copied());
            TimelinePoint {
                timestamp: chunk[0].timestamp,
                focus_score: mean.focus_score,
                posture_score: mean.posture_score,
                eye_strain_level: mean.eye_strain_level,
                face_detected: detected * 2 > chunk.len(),
            }
        })
        .collect()
}

/// Mean scores (distractions left at zero) and the face-detected count.
fn means<'a>(activities: impl IntoIterator<Item = &'a Activity>) -> (AverageMetrics, usize) {
    let mut sum = AverageMetrics::default();
    let mut detected = 0;
    let mut count: usize = 0;

    for a in activities {
        count += 1;
        sum.focus_score += a.metrics.focus_score;
        sum.posture_score += a.metrics.posture_score;
        sum.eye_strain_level += a.metrics.eye_strain_level;
        if a.metrics.face_detected {
            detected += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let n = count.max(1) as f64;

    (
        AverageMetrics {
            focus_score: sum.focus_score / n,
            posture_score: sum.posture_score / n,
            eye_strain_level: sum.eye_strain_level / n,
            distraction_count: 0,
        },
        detected,
    )
}
