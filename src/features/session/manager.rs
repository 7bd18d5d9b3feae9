//! Session lifecycle manager.
//!
//! Every mutating call runs under a per-session lock: load, apply the
//! transition to the loaded copy, persist, and only then publish. If any
//! step fails the stored session is left as it was and nothing is published.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use super::events::{NotificationSink, SessionEvent};
use super::model::{BreakKind, NewSession, Session, SessionStatus};
use super::store::{SessionFilter, SessionStore};
use crate::config::{Config, SessionConfig};
use crate::core::{ActivityId, Clock, SessionId, SystemClock, UserId};
use crate::error::TrackerError;
use crate::features::activity::{
    dashboard_aggregate, timeline, Activity, Analyzer, MetricSample, Observation,
    Recommendation, SessionAnalytics, TimelinePoint,
};
use crate::features::stats::{ReportPeriod, StudyReport, User};

/// One mutex per session, present only while some call holds or waits on it.
#[derive(Debug, Default)]
struct SessionLocks {
    inner: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    fn handle(&self, id: SessionId) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(id).or_default())
    }

    /// Give a handle back, dropping the entry once nobody else holds it.
    ///
    /// Handles are cloned and dropped only under the map lock, so the count
    /// seen here is exact.
    fn release(&self, id: SessionId, handle: Arc<Mutex<()>>) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        drop(handle);
        if map.get(&id).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            map.remove(&id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Result of [`SessionManager::record_activity`].
#[derive(Debug, Clone, Serialize)]
pub struct RecordedActivity {
    /// The session after the sample was folded in.
    pub session: Session,
    /// The stored activity.
    pub activity: Activity,
    /// Suggestions derived from the observation.
    pub recommendations: Vec<Recommendation>,
}

/// Owns the rules for moving sessions through their lifecycle.
pub struct SessionManager<S, N> {
    store: S,
    sink: N,
    clock: Arc<dyn Clock>,
    limits: SessionConfig,
    analyzer: Analyzer,
    locks: SessionLocks,
}

impl<S: SessionStore, N: NotificationSink> SessionManager<S, N> {
    /// Create a manager with the system clock and default settings.
    pub fn new(store: S, sink: N) -> Self {
        Self {
            store,
            sink,
            clock: Arc::new(SystemClock),
            limits: SessionConfig::default(),
            analyzer: Analyzer::default(),
            locks: SessionLocks::default(),
        }
    }

    /// Use a different time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Apply session limits and analysis thresholds from a config.
    #[must_use]
    pub fn with_config(mut self, config: &Config) -> Self {
        self.limits = config.session.clone();
        self.analyzer = Analyzer::new(config.analysis.clone());
        self
    }

    /// Current time according to the manager's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // --- users ---

    /// Add a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the user cannot be stored.
    pub fn create_user(&self, name: &str) -> Result<User, TrackerError> {
        let user = User::new(name, self.clock.now())?;
        self.store.insert_user(&user)?;
        log::info!("created user {} ({})", user.id, user.name);
        Ok(user)
    }

    /// Look a user up.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no such user.
    pub fn user(&self, id: UserId) -> Result<User, TrackerError> {
        self.store
            .get_user(id)?
            .ok_or_else(|| TrackerError::NotFound(format!("user {id}")))
    }

    // --- lifecycle ---

    /// Plan a new session.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown owner, `Validation` for bad input.
    pub fn create(&self, request: NewSession) -> Result<Session, TrackerError> {
        self.user(request.owner_id)?;
        let session = Session::create(request, &self.limits, self.clock.now())?;
        self.store.insert_session(&session)?;
        log::info!("created session {} ({})", session.id, session.subject);

        self.sink.publish(&SessionEvent::Created {
            session_id: session.id,
        });
        Ok(session)
    }

    /// `planned -> active`.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition` or a storage error.
    pub fn start(&self, id: SessionId) -> Result<Session, TrackerError> {
        self.transition(id, |session, now| {
            session.start(now)?;
            Ok(SessionEvent::Started { session_id: id })
        })
    }

    /// `active -> paused`.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition` or a storage error.
    pub fn pause(&self, id: SessionId) -> Result<Session, TrackerError> {
        self.transition(id, |session, now| {
            session.pause(now)?;
            Ok(SessionEvent::Paused { session_id: id })
        })
    }

    /// `paused -> active`.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition` or a storage error.
    pub fn resume(&self, id: SessionId) -> Result<Session, TrackerError> {
        self.transition(id, |session, now| {
            session.resume(now)?;
            Ok(SessionEvent::Resumed { session_id: id })
        })
    }

    /// Abandon a session that has not finished.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition` or a storage error.
    pub fn cancel(&self, id: SessionId) -> Result<Session, TrackerError> {
        self.transition(id, |session, now| {
            let from = session.status;
            session.cancel(now)?;
            Ok(SessionEvent::Cancelled {
                session_id: id,
                from,
            })
        })
    }

    /// Finish a session.
    ///
    /// If activities were recorded the aggregates are replaced by true means
    /// over them. The owner's statistics are updated in the same write.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition` or a storage error.
    pub fn complete(&self, id: SessionId, notes: Option<String>) -> Result<Session, TrackerError> {
        self.locked(id, |mut session| {
            let now = self.clock.now();
            session.complete(now, notes)?;

            let activities = self.store.list_activities(id)?;
            if let Some(analytics) = dashboard_aggregate(&activities) {
                log::debug!(
                    "session {id}: replacing running aggregates with means over {} samples",
                    analytics.total_data_points
                );
                session.adopt_analytics(&analytics);
            }

            let completed_on = now.with_timezone(&Local).date_naive();
            let owner = self.store.complete_session(&session, completed_on)?;
            log::debug!(
                "user {}: {} sessions, streak {}",
                owner.id,
                owner.stats.total_sessions,
                owner.stats.streak_days
            );

            let actual_duration_minutes = session.actual_duration_minutes.unwrap_or(0);
            log::info!("completed session {id} after {actual_duration_minutes} minutes");
            self.sink.publish(&SessionEvent::Completed {
                session_id: id,
                actual_duration_minutes,
            });
            Ok(session)
        })
    }

    /// Append a break.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition`, `Validation` or a storage error.
    pub fn record_break(
        &self,
        id: SessionId,
        duration_minutes: u32,
        kind: BreakKind,
        reason: Option<String>,
    ) -> Result<Session, TrackerError> {
        self.transition(id, |session, now| {
            session.record_break(duration_minutes, kind, reason, &self.limits, now)?;
            Ok(SessionEvent::BreakRecorded {
                session_id: id,
                duration_minutes,
                kind,
            })
        })
    }

    /// Fold a metric sample into the running aggregates.
    ///
    /// A terminal session is returned unchanged.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Validation` or a storage error.
    pub fn apply_sample(&self, id: SessionId, sample: &MetricSample) -> Result<Session, TrackerError> {
        self.locked(id, |mut session| {
            if !session.apply_sample(sample, self.clock.now())? {
                return Ok(session);
            }
            self.store.update_session(&session)?;
            self.sink.publish(&SessionEvent::SampleApplied { session_id: id });
            Ok(session)
        })
    }

    /// Score a raw observation, store it as an activity, and fold it into
    /// the session.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the session is active, `NotFound` or a
    /// storage error.
    pub fn record_activity(
        &self,
        id: SessionId,
        observation: &Observation,
    ) -> Result<RecordedActivity, TrackerError> {
        self.locked(id, |mut session| {
            if session.status != SessionStatus::Active {
                return Err(TrackerError::InvalidTransition {
                    action: "record activity on",
                    from: session.status,
                });
            }

            let now = self.clock.now();
            let minutes = session.elapsed(now).num_minutes();
            let analysis = self.analyzer.analyze(observation, minutes);

            let activity = Activity {
                id: ActivityId::new(),
                session_id: id,
                timestamp: now,
                metrics: analysis.metrics,
                alerts: analysis.alerts,
            };

            for alert in &activity.alerts {
                *session.total_alerts.entry(alert.kind).or_default() += 1;
            }
            session.apply_sample(&activity.metrics.sample(), now)?;

            self.store.insert_activity(&activity, &session)?;
            log::debug!(
                "session {id}: recorded activity with {} alerts",
                activity.alerts.len()
            );

            self.sink.publish(&SessionEvent::SampleRecorded {
                session_id: id,
                alerts: activity.alerts.clone(),
                recommendations: analysis.recommendations.clone(),
            });

            Ok(RecordedActivity {
                session,
                activity,
                recommendations: analysis.recommendations,
            })
        })
    }

    // --- queries ---

    /// Look a session up.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no such session.
    pub fn session(&self, id: SessionId) -> Result<Session, TrackerError> {
        self.store
            .get_session(id)?
            .ok_or_else(|| TrackerError::NotFound(format!("session {id}")))
    }

    /// Sessions matching a filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn list_sessions(&self, filter: SessionFilter) -> Result<Vec<Session>, TrackerError> {
        self.store.list_sessions(filter)
    }

    /// Activities of a session, oldest first.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no such session.
    pub fn activities(&self, id: SessionId) -> Result<Vec<Activity>, TrackerError> {
        self.session(id)?;
        self.store.list_activities(id)
    }

    /// Aggregate of a session's activities; `None` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no such session.
    pub fn analytics(&self, id: SessionId) -> Result<Option<SessionAnalytics>, TrackerError> {
        Ok(dashboard_aggregate(&self.activities(id)?))
    }

    /// Downsampled metric timeline of a session.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no such session.
    pub fn timeline(
        &self,
        id: SessionId,
        max_points: usize,
    ) -> Result<Vec<TimelinePoint>, TrackerError> {
        Ok(timeline(&self.activities(id)?, max_points))
    }

    /// Report over a user's sessions.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown user.
    pub fn report(&self, owner: UserId, period: ReportPeriod) -> Result<StudyReport, TrackerError> {
        self.user(owner)?;
        let sessions = self.store.list_sessions(SessionFilter {
            owner: Some(owner),
            status: None,
        })?;
        let today = self.clock.now().with_timezone(&Local).date_naive();
        Ok(StudyReport::generate(&sessions, period, today))
    }

    // --- plumbing ---

    /// Run `f` on the stored session while holding its lock.
    fn locked<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(Session) -> Result<T, TrackerError>,
    ) -> Result<T, TrackerError> {
        let handle = self.locks.handle(id);
        let result = {
            let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
            self.session(id).and_then(f)
        };
        self.locks.release(id, handle);
        result
    }

    /// Apply a single-record transition and publish its event.
    fn transition(
        &self,
        id: SessionId,
        apply: impl FnOnce(&mut Session, DateTime<Utc>) -> Result<SessionEvent, TrackerError>,
    ) -> Result<Session, TrackerError> {
        self.locked(id, |mut session| {
            let from = session.status;
            let event = apply(&mut session, self.clock.now())?;
            self.store.update_session(&session)?;
            log::debug!("session {id}: {from} -> {} ({})", session.status, event.name());
            self.sink.publish(&event);
            Ok(session)
        })
    }
}
