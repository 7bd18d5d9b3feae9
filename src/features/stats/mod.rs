//! User statistics and study reports.
//!
//! - Cumulative per-user statistics, updated on completion
//! - Calendar-day study streaks
//! - Period reports over session history

pub mod report;
pub mod user;

pub use report::{DailyStudyTime, ReportPeriod, StudyReport, SubjectTime};
pub use user::{record_session, user_streak, User, UserStats};
