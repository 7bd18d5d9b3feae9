//! Session command implementation.

use colored::Colorize;

use crate::cli::args::{CreateSessionArgs, OutputFormat, SampleArgs, SessionCommands};
use crate::config::Config;
use crate::core::SessionId;
use crate::error::TrackerError;
use crate::features::activity::{MetricSample, SimulatedDetector};
use crate::features::session::{
    NewSession, NotificationSink, Session, SessionFilter, SessionManager, SessionStore,
};
use crate::output::{format_recorded, format_session, format_session_pretty, format_sessions, to_json};

/// Execute session subcommands.
///
/// # Errors
///
/// Returns an error if the underlying lifecycle operation fails.
pub fn session<S: SessionStore, N: NotificationSink>(
    manager: &SessionManager<S, N>,
    cmd: SessionCommands,
    config: &Config,
    format: OutputFormat,
) -> Result<String, TrackerError> {
    match cmd {
        SessionCommands::Create(args) => create(manager, args, config, format),

        SessionCommands::Start { session } => {
            let s = manager.start(session)?;
            changed(manager, &s, "Session started", format)
        }

        SessionCommands::Pause { session } => {
            let s = manager.pause(session)?;
            changed(manager, &s, "Session paused", format)
        }

        SessionCommands::Resume { session } => {
            let s = manager.resume(session)?;
            changed(manager, &s, "Session resumed", format)
        }

        SessionCommands::Complete { session, notes } => {
            let s = manager.complete(session, notes)?;
            changed(manager, &s, "Session completed", format)
        }

        SessionCommands::Cancel { session } => {
            let s = manager.cancel(session)?;
            changed(manager, &s, "Session cancelled", format)
        }

        SessionCommands::Break {
            session,
            duration,
            kind,
            reason,
        } => {
            let s = manager.record_break(session, duration, kind, reason)?;
            let message = format!("{duration} minute {} break recorded", kind.display_name());
            changed(manager, &s, &message, format)
        }

        SessionCommands::Sample(args) => sample(manager, &args, format),

        SessionCommands::Simulate {
            session,
            count,
            seed,
        } => simulate(
            manager,
            session,
            count.unwrap_or(config.session.simulate_samples),
            seed,
            format,
        ),

        SessionCommands::Show { session } => {
            let s = manager.session(session)?;
            format_session(&s, manager.now(), format)
        }

        SessionCommands::List { owner, status } => {
            let sessions = manager.list_sessions(SessionFilter { owner, status })?;
            format_sessions(&sessions, format)
        }
    }
}

fn changed<S: SessionStore, N: NotificationSink>(
    manager: &SessionManager<S, N>,
    session: &Session,
    message: &str,
    format: OutputFormat,
) -> Result<String, TrackerError> {
    match format {
        OutputFormat::Json => to_json(session),
        OutputFormat::Pretty => Ok(format!(
            "{} {}\n\n{}",
            "✓".green(),
            message,
            format_session_pretty(session, manager.now())
        )),
    }
}

fn create<S: SessionStore, N: NotificationSink>(
    manager: &SessionManager<S, N>,
    args: CreateSessionArgs,
    config: &Config,
    format: OutputFormat,
) -> Result<String, TrackerError> {
    let request = NewSession {
        owner_id: args.owner,
        subject: args.subject,
        target_duration_minutes: args.target.unwrap_or(config.session.default_target_minutes),
        difficulty: args.difficulty,
        goal: args.goal,
        tags: args.tags,
    };
    let session = manager.create(request)?;

    match format {
        OutputFormat::Json => to_json(&session),
        OutputFormat::Pretty => Ok(format!(
            "{} Session planned\n\n{}\n{}",
            "✓".green(),
            format_session_pretty(&session, manager.now()),
            format!("   Use 'studytrack session start {}' to begin", session.id).dimmed()
        )),
    }
}

fn sample<S: SessionStore, N: NotificationSink>(
    manager: &SessionManager<S, N>,
    args: &SampleArgs,
    format: OutputFormat,
) -> Result<String, TrackerError> {
    let sample = MetricSample {
        focus_score: args.focus,
        posture_score: args.posture,
        eye_strain_level: args.eye_strain,
        distraction_count: args.distractions,
    };
    let before = manager.session(args.session)?;
    let after = manager.apply_sample(args.session, &sample)?;

    let message = if before == after {
        "Session is closed, sample ignored"
    } else {
        "Sample applied"
    };
    changed(manager, &after, message, format)
}

fn simulate<S: SessionStore, N: NotificationSink>(
    manager: &SessionManager<S, N>,
    session: SessionId,
    count: usize,
    seed: Option<u64>,
    format: OutputFormat,
) -> Result<String, TrackerError> {
    let detector = seed.map_or_else(SimulatedDetector::from_entropy, SimulatedDetector::seeded);

    let recorded = detector
        .take(count)
        .map(|observation| manager.record_activity(session, &observation))
        .collect::<Result<Vec<_>, _>>()?;

    format_recorded(&recorded, format)
}
