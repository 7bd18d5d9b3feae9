//! Study sessions.
//!
//! - Session data model and state machine
//! - Lifecycle notifications
//! - Persistence
//! - The manager that serialises work per session

pub mod events;
pub mod lifecycle;
pub mod manager;
pub mod model;
pub mod store;

pub use events::{LogSink, NotificationSink, NullSink, SessionEvent};
pub use manager::{RecordedActivity, SessionManager};
pub use model::{
    AverageMetrics, BreakEntry, BreakKind, Difficulty, NewSession, Session, SessionStatus,
};
pub use store::{SessionFilter, SessionStore, SqliteStore};
