//! Study reports over a user's session history.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;
use crate::features::session::{Session, SessionStatus};

/// Report time period, in local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    /// Today only
    Today,
    /// Last 7 days
    Week,
    /// Last 30 days
    Month,
    /// All time
    AllTime,
}

impl ReportPeriod {
    /// First day included in the period, or `None` for all time.
    #[must_use]
    pub fn first_day(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Today => Some(today),
            Self::Week => Some(today - Duration::days(6)),
            Self::Month => Some(today - Duration::days(29)),
            Self::AllTime => None,
        }
    }

    /// Get display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Week => "This Week",
            Self::Month => "This Month",
            Self::AllTime => "All Time",
        }
    }
}

impl FromStr for ReportPeriod {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" | "t" | "d" => Ok(Self::Today),
            "week" | "w" | "7d" => Ok(Self::Week),
            "month" | "m" | "30d" => Ok(Self::Month),
            "all" | "alltime" | "all-time" => Ok(Self::AllTime),
            other => Err(TrackerError::validation(
                "period",
                format!("unknown period '{other}'"),
            )),
        }
    }
}

/// Study time per subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectTime {
    /// Subject
    pub subject: String,
    /// Total minutes
    pub minutes: u64,
    /// Session count
    pub sessions: u32,
}

/// Study time per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStudyTime {
    /// Date
    pub date: NaiveDate,
    /// Total minutes
    pub minutes: u64,
    /// Session count
    pub sessions: u32,
}

/// Aggregate view of sessions in a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyReport {
    /// Report period name
    pub period: String,
    /// Total studied minutes over completed sessions
    pub total_minutes: u64,
    /// Number of completed sessions
    pub completed_sessions: u32,
    /// Number of cancelled sessions
    pub cancelled_sessions: u32,
    /// Average completed session length in minutes
    pub avg_session_minutes: f64,
    /// Longest completed session in minutes
    pub longest_session_minutes: u32,
    /// Mean focus across completed sessions
    pub average_focus_score: f64,
    /// Minutes by weekday, Monday first
    pub by_day_of_week: [u64; 7],
    /// Subjects, most studied first
    pub by_subject: Vec<SubjectTime>,
    /// Days, most recent first
    pub daily: Vec<DailyStudyTime>,
    /// Consecutive days up to today (or yesterday) with a completed session
    pub streak_days: u32,
}

fn study_day(session: &Session) -> Option<NaiveDate> {
    session
        .end_time
        .or(session.start_time)
        .map(|t| t.with_timezone(&Local).date_naive())
}

impl StudyReport {
    /// Build a report from a session list. Sessions outside the period,
    /// and sessions that are neither completed nor cancelled, are ignored.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn generate(sessions: &[Session], period: ReportPeriod, today: NaiveDate) -> Self {
        let first_day = period.first_day(today);
        let in_period = |s: &&Session| {
            let day = study_day(s).unwrap_or_else(|| s.created_at.with_timezone(&Local).date_naive());
            first_day.map_or(true, |first| day >= first) && day <= today
        };

        let completed: Vec<&Session> = sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .filter(in_period)
            .collect();
        let cancelled_sessions = sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Cancelled)
            .filter(in_period)
            .count();

        let minutes = |s: &Session| u64::from(s.actual_duration_minutes.unwrap_or(0));
        let total_minutes: u64 = completed.iter().map(|s| minutes(s)).sum();
        let completed_count = completed.len();

        let (avg_session_minutes, average_focus_score) = if completed_count > 0 {
            let n = completed_count as f64;
            let focus: f64 = completed.iter().map(|s| s.average_metrics.focus_score).sum();
            (total_minutes as f64 / n, focus / n)
        } else {
            (0.0, 0.0)
        };

        let longest_session_minutes = completed
            .iter()
            .filter_map(|s| s.actual_duration_minutes)
            .max()
            .unwrap_or(0);

        let mut by_day_of_week = [0u64; 7];
        let mut subject_map: HashMap<&str, (u64, u32)> = HashMap::new();
        let mut daily_map: HashMap<NaiveDate, (u64, u32)> = HashMap::new();

        for session in &completed {
            let Some(day) = study_day(session) else {
                continue;
            };
            let m = minutes(session);

            by_day_of_week[day.weekday().num_days_from_monday() as usize] += m;

            let entry = subject_map.entry(session.subject.as_str()).or_default();
            entry.0 += m;
            entry.1 += 1;

            let entry = daily_map.entry(day).or_default();
            entry.0 += m;
            entry.1 += 1;
        }

        let mut by_subject: Vec<SubjectTime> = subject_map
            .into_iter()
            .map(|(subject, (minutes, sessions))| SubjectTime {
                subject: subject.to_string(),
                minutes,
                sessions,
            })
            .collect();
        by_subject.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.subject.cmp(&b.subject)));

        let mut daily: Vec<DailyStudyTime> = daily_map
            .into_iter()
            .map(|(date, (minutes, sessions))| DailyStudyTime {
                date,
                minutes,
                sessions,
            })
            .collect();
        daily.sort_by(|a, b| b.date.cmp(&a.date));

        let streak_days = current_streak(daily.iter().map(|d| d.date), today);

        Self {
            period: period.display_name().to_string(),
            total_minutes,
            completed_sessions: u32::try_from(completed_count).unwrap_or(u32::MAX),
            cancelled_sessions: u32::try_from(cancelled_sessions).unwrap_or(u32::MAX),
            avg_session_minutes,
            longest_session_minutes,
            average_focus_score,
            by_day_of_week,
            by_subject,
            daily,
            streak_days,
        }
    }

    /// Get total hours.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_hours(&self) -> f64 {
        self.total_minutes as f64 / 60.0
    }
}

/// Count consecutive study days ending today, or yesterday if nothing was
/// completed today.
fn current_streak(days: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u32 {
    let mut dates: Vec<NaiveDate> = days.into_iter().collect();
    dates.sort_unstable();
    dates.dedup();

    let mut check = today;
    if dates.binary_search(&check).is_err() {
        check = today - Duration::days(1);
    }

    let mut streak = 0;
    while dates.binary_search(&check).is_ok() {
        streak += 1;
        check -= Duration::days(1);
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::core::UserId;
    use crate::features::session::NewSession;
    use chrono::{TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 20).unwrap()
    }

    fn session(subject: &str, days_ago: i64, minutes: u32, status: SessionStatus) -> Session {
        let day = today() - Duration::days(days_ago);
        let end = Local
            .from_local_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
            .single()
            .unwrap()
            .with_timezone(&Utc);
        let start = end - Duration::minutes(i64::from(minutes));

        let mut s = Session::create(
            NewSession::new(UserId::new(), subject, 60),
            &SessionConfig::default(),
            start,
        )
        .unwrap();
        s.start(start).unwrap();
        match status {
            SessionStatus::Completed => s.complete(end, None).unwrap(),
            SessionStatus::Cancelled => s.cancel(end).unwrap(),
            _ => {}
        }
        s
    }

    #[test]
    fn test_period_from_str() {
        assert_eq!("today".parse::<ReportPeriod>().unwrap(), ReportPeriod::Today);
        assert_eq!("7d".parse::<ReportPeriod>().unwrap(), ReportPeriod::Week);
        assert_eq!("all".parse::<ReportPeriod>().unwrap(), ReportPeriod::AllTime);
        assert!("fortnight".parse::<ReportPeriod>().is_err());
    }

    #[test]
    fn test_empty_report() {
        let report = StudyReport::generate(&[], ReportPeriod::Week, today());
        assert_eq!(report.total_minutes, 0);
        assert_eq!(report.completed_sessions, 0);
        assert_eq!(report.streak_days, 0);
        assert!(report.by_subject.is_empty());
    }

    #[test]
    fn test_report_totals_and_subjects() {
        let sessions = vec![
            session("Maths", 0, 30, SessionStatus::Completed),
            session("Maths", 1, 45, SessionStatus::Completed),
            session("Physics", 1, 60, SessionStatus::Completed),
            session("Physics", 2, 10, SessionStatus::Cancelled),
            session("Chemistry", 20, 90, SessionStatus::Completed),
            session("Biology", 0, 15, SessionStatus::Active),
        ];
        let report = StudyReport::generate(&sessions, ReportPeriod::Week, today());

        assert_eq!(report.completed_sessions, 3);
        assert_eq!(report.cancelled_sessions, 1);
        assert_eq!(report.total_minutes, 135);
        assert_eq!(report.longest_session_minutes, 60);
        assert!((report.avg_session_minutes - 45.0).abs() < 1e-9);
        assert_eq!(report.by_subject[0].subject, "Maths");
        assert_eq!(report.by_subject[0].minutes, 75);
        assert_eq!(report.daily[0].date, today());
        assert_eq!(report.streak_days, 2);
    }

    #[test]
    fn test_all_time_includes_old_sessions() {
        let sessions = vec![session("Chemistry", 20, 90, SessionStatus::Completed)];
        let report = StudyReport::generate(&sessions, ReportPeriod::AllTime, today());
        assert_eq!(report.total_minutes, 90);
        assert!((report.total_hours() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_streak_from_yesterday() {
        let days = [today() - Duration::days(1), today() - Duration::days(2)];
        assert_eq!(current_streak(days, today()), 2);
        assert_eq!(current_streak([today() - Duration::days(3)], today()), 0);
    }
}
