//! Session persistence.
//!
//! [`SessionStore`] is the seam the manager talks to; [`SqliteStore`] keeps
//! everything in the local database. List-shaped fields are stored as JSON
//! text and timestamps as RFC 3339.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use serde::de::DeserializeOwned;

use super::model::{Session, SessionStatus};
use crate::core::{SessionId, UserId};
use crate::error::TrackerError;
use crate::features::activity::Activity;
use crate::features::stats::{record_session, User, UserStats};
use crate::storage::Database;

/// Which sessions to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFilter {
    /// Only sessions owned by this user.
    pub owner: Option<UserId>,
    /// Only sessions in this status.
    pub status: Option<SessionStatus>,
}

/// Durable storage for users, sessions and activities.
///
/// Multi-record writes (`insert_activity`, `complete_session`) are
/// all-or-nothing.
pub trait SessionStore: Send + Sync {
    /// Add a user.
    fn insert_user(&self, user: &User) -> Result<(), TrackerError>;

    /// Look a user up.
    fn get_user(&self, id: UserId) -> Result<Option<User>, TrackerError>;

    /// Add a new session.
    fn insert_session(&self, session: &Session) -> Result<(), TrackerError>;

    /// Overwrite an existing session.
    fn update_session(&self, session: &Session) -> Result<(), TrackerError>;

    /// Look a session up.
    fn get_session(&self, id: SessionId) -> Result<Option<Session>, TrackerError>;

    /// Sessions matching `filter`, newest first.
    fn list_sessions(&self, filter: SessionFilter) -> Result<Vec<Session>, TrackerError>;

    /// Store an activity together with the session it updated.
    fn insert_activity(&self, activity: &Activity, session: &Session) -> Result<(), TrackerError>;

    /// Activities of a session, oldest first.
    fn list_activities(&self, session_id: SessionId) -> Result<Vec<Activity>, TrackerError>;

    /// Store a completed session and fold it into its owner's statistics.
    ///
    /// The owner is read and written inside the same transaction, so
    /// concurrent completions for one owner each count once. Returns the
    /// owner as stored.
    fn complete_session(
        &self,
        session: &Session,
        completed_on: NaiveDate,
    ) -> Result<User, TrackerError>;
}

/// [`SessionStore`] backed by `SQLite`.
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    /// Create a store over an open database.
    pub const fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Create a store over a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn in_memory() -> Result<Self, TrackerError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

const SESSION_COLUMNS: &str = "id, owner_id, subject, target_duration_minutes, difficulty, goal, \
     tags, status, start_time, end_time, paused_at, pause_accum_minutes, \
     actual_duration_minutes, breaks, average_metrics, total_alerts, notes, \
     created_at, updated_at, pause_accum_seconds";

const USER_COLUMNS: &str = "id, name, created_at, total_study_minutes, total_sessions, \
     average_focus_score, average_posture_score, streak_days, last_study_date";

fn update_session_row(conn: &rusqlite::Connection, session: &Session) -> Result<(), TrackerError> {
    let rows = conn
        .execute(
            r"UPDATE sessions SET
              subject = ?2,
              target_duration_minutes = ?3,
              difficulty = ?4,
              goal = ?5,
              tags = ?6,
              status = ?7,
              start_time = ?8,
              end_time = ?9,
              paused_at = ?10,
              pause_accum_minutes = ?11,
              actual_duration_minutes = ?12,
              breaks = ?13,
              average_metrics = ?14,
              total_alerts = ?15,
              notes = ?16,
              updated_at = ?17,
              pause_accum_seconds = ?18
              WHERE id = ?1",
            params![
                session.id.to_string(),
                session.subject,
                session.target_duration_minutes,
                session.difficulty.as_str(),
                session.goal,
                serde_json::to_string(&session.tags)?,
                session.status.as_str(),
                session.start_time.map(|t| t.to_rfc3339()),
                session.end_time.map(|t| t.to_rfc3339()),
                session.paused_at.map(|t| t.to_rfc3339()),
                session.pause_accum_minutes,
                session.actual_duration_minutes,
                serde_json::to_string(&session.breaks)?,
                serde_json::to_string(&session.average_metrics)?,
                serde_json::to_string(&session.total_alerts)?,
                session.notes,
                session.updated_at.to_rfc3339(),
                session.pause_accum_seconds,
            ],
        )
        .map_err(|e| TrackerError::StorageUnavailable(format!("Failed to update session: {e}")))?;

    if rows == 0 {
        return Err(TrackerError::NotFound(format!("session {}", session.id)));
    }
    Ok(())
}

impl SessionStore for SqliteStore {
    fn insert_user(&self, user: &User) -> Result<(), TrackerError> {
        let db = self.db();
        let stats = &user.stats;

        db.connection()
            .execute(
                &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                params![
                    user.id.to_string(),
                    user.name,
                    user.created_at.to_rfc3339(),
                    i64::try_from(stats.total_study_minutes).unwrap_or(i64::MAX),
                    stats.total_sessions,
                    stats.average_focus_score,
                    stats.average_posture_score,
                    stats.streak_days,
                    stats.last_study_date.map(|d| d.to_string()),
                ],
            )
            .map_err(|e| TrackerError::StorageUnavailable(format!("Failed to insert user: {e}")))?;
        Ok(())
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, TrackerError> {
        let db = self.db();

        let user = db
            .connection()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [id.to_string()],
                row_to_user,
            )
            .optional()
            .map_err(|e| TrackerError::StorageUnavailable(format!("Failed to query user: {e}")))?;
        Ok(user)
    }

    fn insert_session(&self, session: &Session) -> Result<(), TrackerError> {
        let db = self.db();

        db.connection()
            .execute(
                &format!(
                    "INSERT INTO sessions ({SESSION_COLUMNS}) VALUES \
                     (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)"
                ),
                params![
                    session.id.to_string(),
                    session.owner_id.to_string(),
                    session.subject,
                    session.target_duration_minutes,
                    session.difficulty.as_str(),
                    session.goal,
                    serde_json::to_string(&session.tags)?,
                    session.status.as_str(),
                    session.start_time.map(|t| t.to_rfc3339()),
                    session.end_time.map(|t| t.to_rfc3339()),
                    session.paused_at.map(|t| t.to_rfc3339()),
                    session.pause_accum_minutes,
                    session.actual_duration_minutes,
                    serde_json::to_string(&session.breaks)?,
                    serde_json::to_string(&session.average_metrics)?,
                    serde_json::to_string(&session.total_alerts)?,
                    session.notes,
                    session.created_at.to_rfc3339(),
                    session.updated_at.to_rfc3339(),
                    session.pause_accum_seconds,
                ],
            )
            .map_err(|e| {
                TrackerError::StorageUnavailable(format!("Failed to insert session: {e}"))
            })?;
        Ok(())
    }

    fn update_session(&self, session: &Session) -> Result<(), TrackerError> {
        let db = self.db();
        update_session_row(db.connection(), session)
    }

    fn get_session(&self, id: SessionId) -> Result<Option<Session>, TrackerError> {
        let db = self.db();

        let session = db
            .connection()
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                [id.to_string()],
                row_to_session,
            )
            .optional()
            .map_err(|e| {
                TrackerError::StorageUnavailable(format!("Failed to query session: {e}"))
            })?;
        Ok(session)
    }

    fn list_sessions(&self, filter: SessionFilter) -> Result<Vec<Session>, TrackerError> {
        let db = self.db();
        let conn = db.connection();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE (?1 IS NULL OR owner_id = ?1)
                   AND (?2 IS NULL OR status = ?2)
                 ORDER BY created_at DESC"
            ))
            .map_err(|e| TrackerError::StorageUnavailable(format!("Failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map(
                params![
                    filter.owner.map(|o| o.to_string()),
                    filter.status.map(|s| s.as_str()),
                ],
                row_to_session,
            )
            .map_err(|e| {
                TrackerError::StorageUnavailable(format!("Failed to query sessions: {e}"))
            })?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    fn insert_activity(&self, activity: &Activity, session: &Session) -> Result<(), TrackerError> {
        let mut db = self.db();
        let tx = db.connection_mut().transaction()?;

        tx.execute(
            r"INSERT INTO activities (id, session_id, timestamp, metrics, alerts)
              VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                activity.id.to_string(),
                activity.session_id.to_string(),
                activity.timestamp.to_rfc3339(),
                serde_json::to_string(&activity.metrics)?,
                serde_json::to_string(&activity.alerts)?,
            ],
        )
        .map_err(|e| TrackerError::StorageUnavailable(format!("Failed to insert activity: {e}")))?;
        update_session_row(&tx, session)?;

        tx.commit()?;
        Ok(())
    }

    fn list_activities(&self, session_id: SessionId) -> Result<Vec<Activity>, TrackerError> {
        let db = self.db();
        let conn = db.connection();

        let mut stmt = conn
            .prepare(
                r"SELECT id, session_id, timestamp, metrics, alerts
                  FROM activities
                  WHERE session_id = ?1
                  ORDER BY timestamp ASC",
            )
            .map_err(|e| TrackerError::StorageUnavailable(format!("Failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([session_id.to_string()], row_to_activity)
            .map_err(|e| {
                TrackerError::StorageUnavailable(format!("Failed to query activities: {e}"))
            })?;

        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }

    fn complete_session(
        &self,
        session: &Session,
        completed_on: NaiveDate,
    ) -> Result<User, TrackerError> {
        let mut db = self.db();
        let tx = db
            .connection_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        update_session_row(&tx, session)?;

        let mut owner = tx
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [session.owner_id.to_string()],
                row_to_user,
            )
            .optional()
            .map_err(|e| TrackerError::StorageUnavailable(format!("Failed to query user: {e}")))?
            .ok_or_else(|| TrackerError::NotFound(format!("user {}", session.owner_id)))?;
        owner.stats = record_session(&owner.stats, session, completed_on);

        let stats = &owner.stats;
        tx.execute(
            r"UPDATE users SET
              total_study_minutes = ?2,
              total_sessions = ?3,
              average_focus_score = ?4,
              average_posture_score = ?5,
              streak_days = ?6,
              last_study_date = ?7
              WHERE id = ?1",
            params![
                owner.id.to_string(),
                i64::try_from(stats.total_study_minutes).unwrap_or(i64::MAX),
                stats.total_sessions,
                stats.average_focus_score,
                stats.average_posture_score,
                stats.streak_days,
                stats.last_study_date.map(|d| d.to_string()),
            ],
        )
        .map_err(|e| TrackerError::StorageUnavailable(format!("Failed to update user: {e}")))?;

        tx.commit()?;
        Ok(owner)
    }
}

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn parse<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| conversion_error(idx, e))
}

fn time(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn required_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    time(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "timestamp".to_string(),
        Type::Null,
    ))
}

fn json<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| conversion_error(idx, e))
}

/// Convert a database row to a Session.
fn row_to_session(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: parse(row, 0)?,
        owner_id: parse(row, 1)?,
        subject: row.get(2)?,
        target_duration_minutes: row.get(3)?,
        difficulty: parse(row, 4)?,
        goal: row.get(5)?,
        tags: json(row, 6)?,
        status: parse(row, 7)?,
        start_time: time(row, 8)?,
        end_time: time(row, 9)?,
        paused_at: time(row, 10)?,
        pause_accum_minutes: row.get(11)?,
        actual_duration_minutes: row.get(12)?,
        breaks: json(row, 13)?,
        average_metrics: json(row, 14)?,
        total_alerts: json(row, 15)?,
        notes: row.get(16)?,
        created_at: required_time(row, 17)?,
        updated_at: required_time(row, 18)?,
        pause_accum_seconds: row.get(19)?,
    })
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let total_study_minutes: i64 = row.get(3)?;
    let last_study_date: Option<String> = row.get(8)?;

    Ok(User {
        id: parse(row, 0)?,
        name: row.get(1)?,
        created_at: required_time(row, 2)?,
        stats: UserStats {
            total_study_minutes: u64::try_from(total_study_minutes).unwrap_or(0),
            total_sessions: row.get(4)?,
            average_focus_score: row.get(5)?,
            average_posture_score: row.get(6)?,
            streak_days: row.get(7)?,
            last_study_date: last_study_date
                .map(|d| d.parse::<NaiveDate>().map_err(|e| conversion_error(8, e)))
                .transpose()?,
        },
    })
}

fn row_to_activity(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: parse(row, 0)?,
        session_id: parse(row, 1)?,
        timestamp: required_time(row, 2)?,
        metrics: json(row, 3)?,
        alerts: json(row, 4)?,
    })
}
