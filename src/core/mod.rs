//! Core abstractions for studytrack.
//!
//! Identifiers and the clock shared by every feature module.

mod clock;
mod ids;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::{ActivityId, SessionId, UserId};
