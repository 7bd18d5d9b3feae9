//! `SQLite` database connection and operations.
//!
//! The database is stored at `~/.studytrack/studytrack.db` and contains
//! tables for users, study sessions and activity samples.

use std::time::Duration;

use rusqlite::Connection;

use crate::config::Paths;
use crate::error::TrackerError;

use super::migrations;

/// How long a writer waits for another process to release the database.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the default location.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open() -> Result<Self, TrackerError> {
        let paths = Paths::new()?;
        paths.ensure_dirs()?;
        Self::open_at(&paths.database)
    }

    /// Open the database at a specific path.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &std::path::Path) -> Result<Self, TrackerError> {
        let conn = Connection::open(path).map_err(|e| {
            TrackerError::StorageUnavailable(format!(
                "Failed to open database {}: {e}",
                path.display()
            ))
        })?;
        log::debug!("opened database at {}", path.display());

        Self::from_connection(conn)
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, TrackerError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            TrackerError::StorageUnavailable(format!("Failed to open in-memory database: {e}"))
        })?;

        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, TrackerError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(|e| {
            TrackerError::StorageUnavailable(format!("Failed to enable foreign keys: {e}"))
        })?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(|e| {
            TrackerError::StorageUnavailable(format!("Failed to set busy timeout: {e}"))
        })?;

        let db = Self { conn };
        migrations::run(&db.conn)?;

        Ok(db)
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, TrackerError> {
        migrations::get_version(&self.conn)
    }

    /// Get a reference to the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Get a mutable reference to the underlying connection, for
    /// transactions.
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
