//! Command implementations for studytrack.
//!
//! Each command returns the text to print; `main` does the printing.

mod completions;
mod report;
mod session;
mod user;

pub use completions::completions;
pub use report::report;
pub use session::session;
pub use user::user;
