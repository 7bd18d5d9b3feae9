//! Storage layer for studytrack.
//!
//! This module provides SQLite-based persistence for:
//! - Users and their cumulative statistics
//! - Study sessions
//! - Activity samples recorded during sessions

mod database;
mod migrations;

pub use database::Database;
