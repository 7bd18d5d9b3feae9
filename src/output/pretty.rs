use chrono::{DateTime, Local, Utc};
use colored::{ColoredString, Colorize};

use crate::features::activity::{AlertKind, SessionAnalytics, TimelinePoint};
use crate::features::session::{RecordedActivity, Session, SessionStatus};
use crate::features::stats::{StudyReport, User};

fn status_label(status: SessionStatus) -> ColoredString {
    match status {
        SessionStatus::Planned => "planned".white(),
        SessionStatus::Active => "active".green().bold(),
        SessionStatus::Paused => "paused".yellow(),
        SessionStatus::Completed => "completed".green(),
        SessionStatus::Cancelled => "cancelled".red(),
    }
}

fn local_time(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Color a 0-100 score where higher is better.
fn score(value: f64) -> ColoredString {
    let text = format!("{value:.1}");
    if value >= 70.0 {
        text.green()
    } else if value >= 50.0 {
        text.yellow()
    } else {
        text.red()
    }
}

/// Color a 0-100 level where lower is better.
fn strain(value: f64) -> ColoredString {
    let text = format!("{value:.1}");
    if value > 80.0 {
        text.red()
    } else if value > 60.0 {
        text.yellow()
    } else {
        text.green()
    }
}

fn bar(fraction: f64, width: usize) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = (fraction.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Format a single session as pretty output
pub fn format_session_pretty(session: &Session, now: DateTime<Utc>) -> String {
    let mut output = format!(
        "{} [{}]\n",
        session.subject.bold(),
        status_label(session.status)
    );
    output.push_str(&format!("  {}: {}\n", "ID".dimmed(), session.id));
    output.push_str(&format!("  {}: {}\n", "Owner".dimmed(), session.owner_id));
    output.push_str(&format!(
        "  {}: {} min ({})\n",
        "Target".dimmed(),
        session.target_duration_minutes,
        session.difficulty.as_str()
    ));

    if let Some(goal) = &session.goal {
        output.push_str(&format!("  {}: {}\n", "Goal".dimmed(), goal));
    }
    if !session.tags.is_empty() {
        let tags = session
            .tags
            .iter()
            .map(|t| format!("#{t}"))
            .collect::<Vec<_>>()
            .join(" ");
        output.push_str(&format!("  {}: {}\n", "Tags".dimmed(), tags.cyan()));
    }
    if let Some(start) = session.start_time {
        output.push_str(&format!("  {}: {}\n", "Started".dimmed(), local_time(start)));
    }
    if let Some(end) = session.end_time {
        output.push_str(&format!("  {}: {}\n", "Ended".dimmed(), local_time(end)));
    }

    match session.actual_duration_minutes {
        Some(actual) => output.push_str(&format!("  {}: {actual} min\n", "Studied".dimmed())),
        None if session.start_time.is_some() => {
            let progress = session.progress(now);
            output.push_str(&format!(
                "  {}: {} {:>3.0}%  ({} min)\n",
                "Progress".dimmed(),
                bar(progress, 20),
                progress * 100.0,
                session.elapsed(now).num_minutes()
            ));
        }
        None => {}
    }
    if session.pause_accum_minutes > 0 {
        output.push_str(&format!(
            "  {}: {} min\n",
            "Paused".dimmed(),
            session.pause_accum_minutes
        ));
    }

    let m = &session.average_metrics;
    output.push_str(&format!(
        "  {}: focus {}  posture {}  eye strain {}  distractions {}\n",
        "Metrics".dimmed(),
        score(m.focus_score),
        score(m.posture_score),
        strain(m.eye_strain_level),
        m.distraction_count
    ));

    if !session.total_alerts.is_empty() {
        output.push_str(&format!("  {}: {}\n", "Alerts".dimmed(), alert_summary(session)));
    }

    if !session.breaks.is_empty() {
        output.push_str(&format!("  {}:\n", "Breaks".dimmed()));
        for b in &session.breaks {
            let mut line = format!(
                "    {} {:>2} min {}",
                local_time(b.start_time),
                b.duration_minutes,
                b.kind.display_name()
            );
            if let Some(reason) = &b.reason {
                line.push_str(&format!("  {}", reason.dimmed()));
            }
            output.push_str(&line);
            output.push('\n');
        }
    }

    if let Some(notes) = &session.notes {
        output.push_str(&format!("  {}: {}\n", "Notes".dimmed(), notes));
    }

    output
}

fn alert_summary(session: &Session) -> String {
    session
        .total_alerts
        .iter()
        .map(|(kind, count)| format!("{} {count}", kind.display_name()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format a list of sessions as a pretty table
pub fn format_sessions_pretty(sessions: &[Session]) -> String {
    if sessions.is_empty() {
        return "Sessions (0)\n  No sessions".to_string();
    }

    let mut output = format!("Sessions ({})\n", sessions.len());
    output.push_str(&"─".repeat(72));
    output.push('\n');

    for session in sessions {
        let minutes = session
            .actual_duration_minutes
            .map_or_else(|| format!("{}m target", session.target_duration_minutes), |m| format!("{m}m"));

        output.push_str(&format!(
            "{}  {:<10} {:<28} {:>10}  {}\n",
            session.id.to_string().dimmed(),
            status_label(session.status),
            truncate(&session.subject, 28),
            minutes,
            score(session.average_metrics.focus_score)
        ));
    }

    output
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max - 3).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}

/// Format a user's statistics
pub fn format_user_pretty(user: &User) -> String {
    let stats = &user.stats;
    let mut output = format!("{}\n", user.name.bold());
    output.push_str(&format!("  {}: {}\n", "ID".dimmed(), user.id));
    output.push_str(&format!(
        "  {}: {} min over {} sessions\n",
        "Studied".dimmed(),
        stats.total_study_minutes,
        stats.total_sessions
    ));
    output.push_str(&format!(
        "  {}: focus {}  posture {}\n",
        "Averages".dimmed(),
        score(stats.average_focus_score),
        score(stats.average_posture_score)
    ));

    let streak = format!("{} days", stats.streak_days);
    output.push_str(&format!(
        "  {}: {}\n",
        "Streak".dimmed(),
        if stats.streak_days > 0 {
            streak.green().bold()
        } else {
            streak.normal()
        }
    ));
    if let Some(last) = stats.last_study_date {
        output.push_str(&format!("  {}: {}\n", "Last study".dimmed(), last));
    }
    output
}

/// Format session analytics with an optional timeline
pub fn format_analytics_pretty(
    analytics: Option<&SessionAnalytics>,
    points: &[TimelinePoint],
) -> String {
    let Some(a) = analytics else {
        return "No activity recorded for this session".to_string();
    };

    let mut output = format!("{}\n", "Session analytics".bold());
    output.push_str(&"─".repeat(50));
    output.push('\n');
    output.push_str(&format!("  Samples:           {}\n", a.total_data_points));
    output.push_str(&format!(
        "  Span:              {} - {}\n",
        local_time(a.time_range.start),
        local_time(a.time_range.end)
    ));
    output.push_str(&format!("  Face detected:     {:.0}%\n", a.face_detection_rate));
    output.push_str(&format!(
        "  Focus:             {}\n",
        score(a.average_metrics.focus_score)
    ));
    output.push_str(&format!(
        "  Posture:           {}\n",
        score(a.average_metrics.posture_score)
    ));
    output.push_str(&format!(
        "  Eye strain:        {}\n",
        strain(a.average_metrics.eye_strain_level)
    ));
    output.push_str(&format!(
        "  Distractions:      {}\n",
        a.average_metrics.distraction_count
    ));

    if !a.total_alerts.is_empty() {
        output.push('\n');
        output.push_str("Alerts\n");
        for kind in [
            AlertKind::Focus,
            AlertKind::Posture,
            AlertKind::EyeStrain,
            AlertKind::Detection,
            AlertKind::Distraction,
        ] {
            if let Some(count) = a.total_alerts.get(&kind) {
                output.push_str(&format!("  {:<16} {count}\n", kind.display_name()));
            }
        }
    }

    if !points.is_empty() {
        output.push('\n');
        output.push_str("Focus timeline\n");
        for p in points {
            let marker = if p.face_detected { " " } else { "!" };
            output.push_str(&format!(
                "  {}{} {} {:>5.1}\n",
                p.timestamp.with_timezone(&Local).format("%H:%M"),
                marker,
                bar(p.focus_score / 100.0, 20),
                p.focus_score
            ));
        }
    }

    output
}

/// Format the outcome of a simulation run
pub fn format_recorded_pretty(recorded: &[RecordedActivity]) -> String {
    let Some(last) = recorded.last() else {
        return "No observations recorded".to_string();
    };

    let mut output = format!("Recorded {} observations\n", recorded.len());
    for r in recorded {
        let m = &r.activity.metrics;
        let face = if m.face_detected { "face" } else { "no face" };
        output.push_str(&format!(
            "  {}  focus {}  posture {}  strain {}  {}\n",
            r.activity.timestamp.with_timezone(&Local).format("%H:%M:%S"),
            score(m.focus_score),
            score(m.posture_score),
            strain(m.eye_strain_level),
            face.dimmed()
        ));
        for alert in &r.activity.alerts {
            output.push_str(&format!("      {} {}\n", "!".yellow(), alert.message));
        }
    }

    if !last.recommendations.is_empty() {
        output.push_str("\nRecommendations\n");
        for rec in &last.recommendations {
            output.push_str(&format!("  - {}\n", rec.message));
        }
    }
    output
}

/// Format a study report
pub fn format_report_pretty(report: &StudyReport) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Study Report: {}", report.period).bold().to_string());
    lines.push("═".repeat(50));
    lines.push(String::new());

    lines.push("Summary".to_string());
    lines.push("─".repeat(40));
    lines.push(format!(
        "  Total study time:    {}h {:02}m",
        report.total_minutes / 60,
        report.total_minutes % 60
    ));
    lines.push(format!("  Completed sessions:  {}", report.completed_sessions));
    lines.push(format!("  Cancelled sessions:  {}", report.cancelled_sessions));
    lines.push(format!(
        "  Average session:     {:.0} minutes",
        report.avg_session_minutes
    ));
    lines.push(format!(
        "  Longest session:     {} minutes",
        report.longest_session_minutes
    ));
    lines.push(format!(
        "  Average focus:       {:.1}",
        report.average_focus_score
    ));
    lines.push(format!("  Current streak:      {} days", report.streak_days));
    lines.push(String::new());

    if report.total_minutes > 0 {
        lines.push("By Day of Week".to_string());
        lines.push("─".repeat(40));
        let days = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
        let max_day = report.by_day_of_week.iter().max().copied().unwrap_or(1).max(1);

        for (day, minutes) in days.iter().zip(report.by_day_of_week) {
            #[allow(clippy::cast_precision_loss)]
            let fraction = minutes as f64 / max_day as f64;
            lines.push(format!("  {day} {minutes:>4}m {}", "█".repeat((fraction * 20.0) as usize)));
        }
        lines.push(String::new());
    }

    if !report.by_subject.is_empty() {
        lines.push("Top Subjects".to_string());
        lines.push("─".repeat(40));
        for subject in report.by_subject.iter().take(5) {
            lines.push(format!(
                "  {:<25} {:>4}m ({} sessions)",
                truncate(&subject.subject, 25),
                subject.minutes,
                subject.sessions
            ));
        }
        lines.push(String::new());
    }

    if !report.daily.is_empty() {
        lines.push("Recent Days".to_string());
        lines.push("─".repeat(40));
        for day in report.daily.iter().take(7) {
            lines.push(format!(
                "  {} {:>4}m ({} sessions)",
                day.date, day.minutes, day.sessions
            ));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::core::UserId;
    use crate::features::session::{BreakKind, NewSession};
    use crate::features::stats::ReportPeriod;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap()
    }

    fn session() -> Session {
        let mut request = NewSession::new(UserId::new(), "Thermodynamics", 40);
        request.goal = Some("Chapter 3".to_string());
        request.tags = vec!["physics".to_string()];
        Session::create(request, &SessionConfig::default(), now()).unwrap()
    }

    #[test]
    fn test_format_session_planned() {
        let output = format_session_pretty(&session(), now());
        assert!(output.contains("Thermodynamics"));
        assert!(output.contains("Chapter 3"));
        assert!(output.contains("#physics"));
        assert!(!output.contains("Progress"));
    }

    #[test]
    fn test_format_session_active_and_completed() {
        let mut s = session();
        s.start(now()).unwrap();
        s.record_break(5, BreakKind::Manual, Some("tired".into()), &SessionConfig::default(), now())
            .unwrap();
        let output = format_session_pretty(&s, now() + Duration::minutes(20));
        assert!(output.contains("Progress"));
        assert!(output.contains("50%"));
        assert!(output.contains("tired"));

        s.complete(now() + Duration::minutes(30), Some("good".into()))
            .unwrap();
        let output = format_session_pretty(&s, now());
        assert!(output.contains("30 min"));
        assert!(output.contains("good"));
    }

    #[test]
    fn test_format_sessions_empty() {
        assert!(format_sessions_pretty(&[]).contains("No sessions"));
    }

    #[test]
    fn test_format_sessions_truncates_subject() {
        let mut s = session();
        s.subject = "A very long subject name that will not fit".to_string();
        let output = format_sessions_pretty(&[s]);
        assert!(output.contains("Sessions (1)"));
        assert!(output.contains("..."));
    }

    #[test]
    fn test_format_analytics_none() {
        assert!(format_analytics_pretty(None, &[]).contains("No activity"));
    }

    #[test]
    fn test_format_user() {
        let mut user = User::new("Ada", now()).unwrap();
        user.stats.streak_days = 3;
        user.stats.last_study_date = NaiveDate::from_ymd_opt(2024, 7, 1);
        let output = format_user_pretty(&user);
        assert!(output.contains("Ada"));
        assert!(output.contains("3 days"));
        assert!(output.contains("2024-07-01"));
    }

    #[test]
    fn test_format_report_empty() {
        let report = StudyReport::generate(&[], ReportPeriod::Week, now().date_naive());
        let output = format_report_pretty(&report);
        assert!(output.contains("This Week"));
        assert!(!output.contains("By Day of Week"));
    }
}
