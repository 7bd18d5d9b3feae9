//! Feature modules for studytrack.

pub mod activity;
pub mod session;
pub mod stats;
