//! Activity samples recorded during a study session.
//!
//! - Raw observations and their scoring into metrics
//! - Alert and recommendation generation
//! - End-of-session aggregation
//! - A simulated observation source

pub mod aggregate;
pub mod analysis;
pub mod model;
pub mod simulator;

pub use aggregate::{dashboard_aggregate, timeline, SessionAnalytics, TimeRange, TimelinePoint};
pub use analysis::{
    Analysis, Analyzer, Emotions, ImageQuality, Observation, Priority, Recommendation,
    RecommendationKind,
};
pub use model::{
    Activity, ActivityMetrics, Alert, AlertCounts, AlertKind, AlertLevel, EyeGaze, HeadPose,
    MetricSample,
};
pub use simulator::SimulatedDetector;
