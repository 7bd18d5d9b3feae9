//! User command implementation.

use colored::Colorize;

use crate::cli::args::{OutputFormat, UserCommands};
use crate::error::TrackerError;
use crate::features::session::{NotificationSink, SessionManager, SessionStore};
use crate::output::{format_report, format_user, format_user_pretty, to_json};

/// Execute user subcommands.
///
/// # Errors
///
/// Returns an error if the user cannot be created or found.
pub fn user<S: SessionStore, N: NotificationSink>(
    manager: &SessionManager<S, N>,
    cmd: UserCommands,
    format: OutputFormat,
) -> Result<String, TrackerError> {
    match cmd {
        UserCommands::Add { name } => {
            let user = manager.create_user(&name)?;
            match format {
                OutputFormat::Json => to_json(&user),
                OutputFormat::Pretty => Ok(format!(
                    "{} User added\n\n{}",
                    "✓".green(),
                    format_user_pretty(&user)
                )),
            }
        }

        UserCommands::Stats { user } => format_user(&manager.user(user)?, format),

        UserCommands::Report { user, period } => {
            format_report(&manager.report(user, period)?, format)
        }
    }
}
