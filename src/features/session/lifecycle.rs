//! Session state machine.
//!
//! ```text
//! planned --start--> active --pause--> paused
//!                      ^                 |
//!                      +-----resume------+
//! active|paused --complete--> completed
//! planned|active|paused --cancel--> cancelled
//! ```
//!
//! Every method validates before it mutates, so a returned error leaves the
//! session untouched.

use chrono::{DateTime, Duration, Utc};

use super::model::{
    AverageMetrics, BreakEntry, BreakKind, NewSession, Session, SessionStatus,
};
use crate::config::SessionConfig;
use crate::core::SessionId;
use crate::error::TrackerError;
use crate::features::activity::{MetricSample, SessionAnalytics};

const MAX_SUBJECT_CHARS: usize = 100;

/// Whole seconds between two instants, never negative.
fn whole_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> u32 {
    let seconds = to.signed_duration_since(from).num_seconds().max(0);
    u32::try_from(seconds).unwrap_or(u32::MAX)
}

impl Session {
    /// Build a new `planned` session from a request.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Validation` if the subject is empty or too long,
    /// or the target duration is outside `1..=max_target_minutes`.
    pub fn create(
        request: NewSession,
        limits: &SessionConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, TrackerError> {
        let subject = request.subject.trim().to_string();
        if subject.is_empty() {
            return Err(TrackerError::validation("subject", "must not be empty"));
        }
        if subject.chars().count() > MAX_SUBJECT_CHARS {
            return Err(TrackerError::validation(
                "subject",
                format!("must be at most {MAX_SUBJECT_CHARS} characters"),
            ));
        }
        if request.target_duration_minutes == 0
            || request.target_duration_minutes > limits.max_target_minutes
        {
            return Err(TrackerError::validation(
                "target_duration_minutes",
                format!("must be between 1 and {}", limits.max_target_minutes),
            ));
        }

        let tags = request
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(Self {
            id: SessionId::new(),
            owner_id: request.owner_id,
            subject,
            target_duration_minutes: request.target_duration_minutes,
            difficulty: request.difficulty,
            goal: request.goal.filter(|g| !g.trim().is_empty()),
            tags,
            status: SessionStatus::Planned,
            start_time: None,
            end_time: None,
            paused_at: None,
            pause_accum_minutes: 0,
            pause_accum_seconds: 0,
            actual_duration_minutes: None,
            breaks: Vec::new(),
            average_metrics: AverageMetrics::default(),
            total_alerts: std::collections::BTreeMap::new(),
            notes: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn invalid(&self, action: &'static str) -> TrackerError {
        TrackerError::InvalidTransition {
            action,
            from: self.status,
        }
    }

    /// `planned -> active`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the session is planned.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), TrackerError> {
        if self.status != SessionStatus::Planned {
            return Err(self.invalid("start"));
        }
        self.status = SessionStatus::Active;
        self.start_time.get_or_insert(now);
        self.updated_at = now;
        Ok(())
    }

    /// `active -> paused`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the session is active.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), TrackerError> {
        if self.status != SessionStatus::Active {
            return Err(self.invalid("pause"));
        }
        self.status = SessionStatus::Paused;
        self.paused_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// `paused -> active`, adding the pause to `pause_accum_minutes`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the session is paused.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), TrackerError> {
        if self.status != SessionStatus::Paused {
            return Err(self.invalid("resume"));
        }
        self.close_pause(now);
        self.status = SessionStatus::Active;
        self.updated_at = now;
        Ok(())
    }

    /// `active|paused -> completed`.
    ///
    /// Closes an open pause, stamps `end_time` and computes
    /// `actual_duration_minutes = floor((end - start - paused) / 60s)`, clamped
    /// at zero. Paused time is counted in seconds and floored only here.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the session is active or paused.
    pub fn complete(
        &mut self,
        now: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<(), TrackerError> {
        if !matches!(self.status, SessionStatus::Active | SessionStatus::Paused) {
            return Err(self.invalid("complete"));
        }
        self.close_pause(now);

        let wall = self.start_time.map_or(0, |start| whole_seconds(start, now));
        self.actual_duration_minutes = Some(wall.saturating_sub(self.pause_accum_seconds) / 60);
        self.end_time = Some(now);
        self.status = SessionStatus::Completed;
        if let Some(n) = notes.filter(|n| !n.trim().is_empty()) {
            self.notes = Some(n);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Any non-terminal status `-> cancelled`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the session is already completed or cancelled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), TrackerError> {
        if self.status.is_terminal() {
            return Err(self.invalid("cancel"));
        }
        self.close_pause(now);
        self.status = SessionStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    fn close_pause(&mut self, now: DateTime<Utc>) {
        if let Some(paused_at) = self.paused_at.take() {
            self.pause_accum_seconds = self
                .pause_accum_seconds
                .saturating_add(whole_seconds(paused_at, now));
            self.pause_accum_minutes = self.pause_accum_seconds / 60;
        }
    }

    /// Append a break.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` on a terminal session; `Validation` if the
    /// duration is outside the configured break limits.
    pub fn record_break(
        &mut self,
        duration_minutes: u32,
        kind: BreakKind,
        reason: Option<String>,
        limits: &SessionConfig,
        now: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        if self.status.is_terminal() {
            return Err(self.invalid("record a break on"));
        }
        if !(limits.break_min_minutes..=limits.break_max_minutes).contains(&duration_minutes) {
            return Err(TrackerError::validation(
                "duration_minutes",
                format!(
                    "must be between {} and {}",
                    limits.break_min_minutes, limits.break_max_minutes
                ),
            ));
        }

        self.breaks.push(BreakEntry {
            start_time: now,
            duration_minutes,
            kind,
            reason: reason.filter(|r| !r.trim().is_empty()),
        });
        self.updated_at = now;
        Ok(())
    }

    /// Fold a metric sample into the running aggregates.
    ///
    /// Returns `Ok(false)` without touching anything when the session is
    /// terminal.
    ///
    /// # Errors
    ///
    /// `Validation` if a score is outside `[0, 100]`.
    pub fn apply_sample(
        &mut self,
        sample: &MetricSample,
        now: DateTime<Utc>,
    ) -> Result<bool, TrackerError> {
        sample.validate()?;
        if self.status.is_terminal() {
            log::warn!(
                "ignoring metric sample for {} session {}",
                self.status,
                self.id
            );
            return Ok(false);
        }
        self.average_metrics.blend(sample);
        self.updated_at = now;
        Ok(true)
    }

    /// Replace the aggregates with ones recomputed from the full activity
    /// list.
    pub fn adopt_analytics(&mut self, analytics: &SessionAnalytics) {
        self.average_metrics = analytics.average_metrics;
        self.total_alerts.clone_from(&analytics.total_alerts);
    }

    /// Time studied so far, excluding pauses.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let Some(start) = self.start_time else {
            return Duration::zero();
        };
        let end = self.end_time.unwrap_or(now);
        let open_pause = self
            .paused_at
            .map_or_else(Duration::zero, |p| end.signed_duration_since(p));

        let elapsed = end.signed_duration_since(start)
            - Duration::seconds(i64::from(self.pause_accum_seconds))
            - open_pause;
        elapsed.max(Duration::zero())
    }

    /// Progress towards the target, 0.0 - 1.0.
    #[must_use]
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let elapsed = self.elapsed(now).num_seconds() as f64;
        let target = f64::from(self.target_duration_minutes) * 60.0;

        if target <= 0.0 {
            return 0.0;
        }
        (elapsed / target).min(1.0)
    }
}
