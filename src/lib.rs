//! studytrack - study session tracking
//!
//! Sessions move through a small lifecycle (planned, active, paused,
//! completed, cancelled) while breaks and focus/posture samples are recorded
//! against them. Completed sessions roll up into per-user statistics and a
//! daily streak.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod output;
pub mod storage;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::TrackerError;
pub use features::session::{SessionManager, SqliteStore};
