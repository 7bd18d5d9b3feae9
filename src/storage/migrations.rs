//! Database migrations for studytrack.
//!
//! Each migration is a function that upgrades the schema by one version.
//! Migrations are run automatically when the database is opened.

use rusqlite::Connection;

use crate::error::TrackerError;

/// Current schema version.
const CURRENT_VERSION: i32 = 2;

/// Get the current schema version from the database.
///
/// Returns 0 if no version has been set (new database).
pub fn get_version(conn: &Connection) -> Result<i32, TrackerError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| TrackerError::StorageUnavailable(format!("Failed to get schema version: {e}")))
}

fn set_version(conn: &Connection, version: i32) -> Result<(), TrackerError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| TrackerError::StorageUnavailable(format!("Failed to set schema version: {e}")))
}

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<(), TrackerError> {
    let current = get_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(());
    }

    for version in (current + 1)..=CURRENT_VERSION {
        log::info!("migrating database schema to v{version}");
        run_migration(conn, version)?;
        set_version(conn, version)?;
    }

    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> Result<(), TrackerError> {
    match version {
        1 => migrate_v1(conn),
        2 => migrate_v2(conn),
        _ => Err(TrackerError::StorageUnavailable(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: Initial schema.
///
/// Creates tables for:
/// - `users`: session owners and their cumulative statistics
/// - `sessions`: study sessions; list-shaped fields are JSON text
/// - `activities`: metric samples, one row per sample
fn migrate_v1(conn: &Connection) -> Result<(), TrackerError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            total_study_minutes INTEGER NOT NULL DEFAULT 0,
            total_sessions INTEGER NOT NULL DEFAULT 0,
            average_focus_score REAL NOT NULL DEFAULT 0,
            average_posture_score REAL NOT NULL DEFAULT 0,
            streak_days INTEGER NOT NULL DEFAULT 0,
            last_study_date TEXT
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL REFERENCES users(id),
            subject TEXT NOT NULL,
            target_duration_minutes INTEGER NOT NULL,
            difficulty TEXT NOT NULL DEFAULT 'medium',
            goal TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'planned',
            start_time TEXT,
            end_time TEXT,
            paused_at TEXT,
            pause_accum_minutes INTEGER NOT NULL DEFAULT 0,
            actual_duration_minutes INTEGER,
            breaks TEXT NOT NULL DEFAULT '[]',
            average_metrics TEXT NOT NULL,
            total_alerts TEXT NOT NULL DEFAULT '{}',
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_owner
        ON sessions(owner_id);

        CREATE INDEX IF NOT EXISTS idx_sessions_status
        ON sessions(status);

        CREATE TABLE IF NOT EXISTS activities (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(id),
            timestamp TEXT NOT NULL,
            metrics TEXT NOT NULL,
            alerts TEXT NOT NULL DEFAULT '[]'
        );

        CREATE INDEX IF NOT EXISTS idx_activities_session_time
        ON activities(session_id, timestamp);
        ",
    )
    .map_err(|e| TrackerError::StorageUnavailable(format!("Migration v1 failed: {e}")))
}

/// Migration v2: track paused time in seconds.
///
/// Existing rows only know whole minutes, so they are backfilled from those.
fn migrate_v2(conn: &Connection) -> Result<(), TrackerError> {
    conn.execute_batch(
        r"
        ALTER TABLE sessions
        ADD COLUMN pause_accum_seconds INTEGER NOT NULL DEFAULT 0;

        UPDATE sessions SET pause_accum_seconds = pause_accum_minutes * 60;
        ",
    )
    .map_err(|e| TrackerError::StorageUnavailable(format!("Migration v2 failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_v1() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();

        run(&conn).unwrap();
        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);

        conn.execute(
            "INSERT INTO users (id, name, created_at) VALUES ('u1', 'Ada', '2024-01-01T10:00:00Z')",
            [],
        )
        .unwrap();

        conn.execute(
            "INSERT INTO sessions (id, owner_id, subject, target_duration_minutes,
                                   average_metrics, created_at, updated_at)
             VALUES ('s1', 'u1', 'Maths', 60, '{}', '2024-01-01T10:00:00Z', '2024-01-01T10:00:00Z')",
            [],
        )
        .unwrap();

        conn.execute(
            "INSERT INTO activities (id, session_id, timestamp, metrics)
             VALUES ('a1', 's1', '2024-01-01T10:05:00Z', '{}')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_migration_v2_backfills_pause_seconds() {
        let conn = Connection::open_in_memory().unwrap();
        migrate_v1(&conn).unwrap();
        set_version(&conn, 1).unwrap();

        conn.execute_batch(
            "INSERT INTO users (id, name, created_at) VALUES ('u1', 'Ada', '2024-01-01T10:00:00Z');
             INSERT INTO sessions (id, owner_id, subject, target_duration_minutes,
                                   pause_accum_minutes, average_metrics, created_at, updated_at)
             VALUES ('s1', 'u1', 'Maths', 60, 7, '{}', '2024-01-01T10:00:00Z', '2024-01-01T10:00:00Z');",
        )
        .unwrap();

        run(&conn).unwrap();
        assert_eq!(get_version(&conn).unwrap(), 2);

        let seconds: i64 = conn
            .query_row(
                "SELECT pause_accum_seconds FROM sessions WHERE id = 's1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(seconds, 420);
    }

    #[test]
    fn test_activity_requires_session() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO activities (id, session_id, timestamp, metrics)
             VALUES ('a1', 'missing', '2024-01-01T10:05:00Z', '{}')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_migration_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run(&conn).unwrap();
        run(&conn).unwrap();

        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_get_version_new_database() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_version(&conn).unwrap(), 0);
    }
}
