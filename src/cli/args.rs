use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

use crate::core::{SessionId, UserId};
use crate::features::session::{BreakKind, Difficulty, SessionStatus};
use crate::features::stats::ReportPeriod;

#[derive(Parser)]
#[command(name = "studytrack")]
#[command(about = "Track study sessions, breaks and focus metrics")]
#[command(long_about = "studytrack - study session tracking

Plan study sessions, move them through their lifecycle, record breaks and
focus/posture samples, and review per-session analytics and streaks.

QUICK START:
  studytrack user add \"Ada\"
  studytrack session create --owner <user-id> --subject \"Linear algebra\" --target 50
  studytrack session start <session-id>
  studytrack session sample <session-id> --focus 80 --posture 70 --eye-strain 20
  studytrack session complete <session-id>

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

For more information on a specific command, run:
  studytrack <command> --help")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Use 'pretty' for human-readable colored output (default),
    /// or 'json' for machine-readable output suitable for scripting.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Database file to use instead of the default location
    #[arg(long, global = true, env = "STUDYTRACK_DB")]
    pub db: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage users
    ///
    /// # Examples
    ///
    ///   studytrack user add "Ada Lovelace"
    ///   studytrack user stats <user-id>
    ///   studytrack user report <user-id> --period month
    User(UserArgs),

    /// Plan, run and inspect study sessions
    ///
    /// # Subcommands
    ///
    ///   create    Plan a new session
    ///   start     planned -> active
    ///   pause     active -> paused
    ///   resume    paused -> active
    ///   complete  Finish a session
    ///   cancel    Abandon a session
    ///   break     Record a break
    ///   sample    Fold a metric sample into the running averages
    ///   simulate  Record simulated observations
    ///   show      Show one session
    ///   list      List sessions
    #[command(alias = "s")]
    Session(SessionArgs),

    /// Analytics over a session's recorded activities
    ///
    /// Shows sample count, mean scores, alert histogram, face detection
    /// rate and a downsampled timeline.
    ///
    /// # Examples
    ///
    ///   studytrack report <session-id>
    ///   studytrack report <session-id> --points 10 -o json
    Report {
        /// Session ID
        session: SessionId,

        /// Maximum number of timeline points
        #[arg(long, default_value_t = 20)]
        points: usize,
    },

    /// Generate shell completions
    ///
    /// Example: studytrack completions zsh > ~/.zsh/completions/_studytrack
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommands,
}

/// User subcommands.
#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a user
    Add {
        /// Display name
        name: String,
    },

    /// Show cumulative statistics and streak
    Stats {
        /// User ID
        user: UserId,
    },

    /// Study report over a period
    ///
    /// Periods: today, week, month, all
    Report {
        /// User ID
        user: UserId,

        /// Report period
        #[arg(long, short = 'p', default_value = "week")]
        period: ReportPeriod,
    },
}

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

/// Session subcommands.
#[derive(Subcommand)]
pub enum SessionCommands {
    /// Plan a new session
    ///
    /// Examples:
    ///   studytrack session create --owner <user-id> --subject "Organic chemistry"
    ///   studytrack session create --owner <user-id> --subject Calculus --target 90 --difficulty hard
    Create(CreateSessionArgs),

    /// Start a planned session
    Start {
        /// Session ID
        session: SessionId,
    },

    /// Pause an active session
    Pause {
        /// Session ID
        session: SessionId,
    },

    /// Resume a paused session
    Resume {
        /// Session ID
        session: SessionId,
    },

    /// Complete an active or paused session
    Complete {
        /// Session ID
        session: SessionId,

        /// Notes to attach
        #[arg(long, short = 'n')]
        notes: Option<String>,
    },

    /// Cancel a session that has not finished
    Cancel {
        /// Session ID
        session: SessionId,
    },

    /// Record a break
    ///
    /// Example: studytrack session break <session-id> --duration 10 --kind scheduled
    Break {
        /// Session ID
        session: SessionId,

        /// Break length in minutes
        #[arg(long, short = 'd', default_value_t = 5)]
        duration: u32,

        /// Break type (manual, scheduled, recommended)
        #[arg(long, short = 'k', default_value = "manual")]
        kind: BreakKind,

        /// Why the break was taken
        #[arg(long, short = 'r')]
        reason: Option<String>,
    },

    /// Fold a metric sample into the session's running averages
    Sample(SampleArgs),

    /// Record simulated observations on an active session
    Simulate {
        /// Session ID
        session: SessionId,

        /// Number of observations (defaults to the configured value)
        #[arg(long, short = 'c')]
        count: Option<usize>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show one session
    Show {
        /// Session ID
        session: SessionId,
    },

    /// List sessions, newest first
    List {
        /// Only sessions of this user
        #[arg(long)]
        owner: Option<UserId>,

        /// Only sessions in this status
        #[arg(long, short = 's')]
        status: Option<SessionStatus>,
    },
}

#[derive(Args)]
pub struct CreateSessionArgs {
    /// Owning user ID
    #[arg(long)]
    pub owner: UserId,

    /// What is being studied
    #[arg(long)]
    pub subject: String,

    /// Planned length in minutes (defaults to the configured value)
    #[arg(long, short = 't')]
    pub target: Option<u32>,

    /// Difficulty (easy, medium, hard)
    #[arg(long, short = 'd', default_value = "medium")]
    pub difficulty: Difficulty,

    /// What the session should achieve
    #[arg(long, short = 'g')]
    pub goal: Option<String>,

    /// Tags (comma-separated or repeated)
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,
}

#[derive(Args)]
pub struct SampleArgs {
    /// Session ID
    pub session: SessionId,

    /// Focus score, 0-100
    #[arg(long)]
    pub focus: f64,

    /// Posture score, 0-100
    #[arg(long)]
    pub posture: f64,

    /// Eye strain level, 0-100
    #[arg(long)]
    pub eye_strain: f64,

    /// Distractions observed
    #[arg(long, default_value_t = 0)]
    pub distractions: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "6f1f5a5e-3b7a-4a4e-9a55-2f9d4f0c1e21";

    #[test]
    fn test_cli_output_format_default() {
        let cli = Cli::try_parse_from(["studytrack", "session", "show", ID]).unwrap();
        assert!(cli.output.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_output_format_json() {
        let cli = Cli::try_parse_from(["studytrack", "-o", "json", "session", "show", ID]).unwrap();
        assert_eq!(cli.output, Some(OutputFormat::Json));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["studytrack", "session", "start", ID, "-vv", "--db", "x.db"])
                .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
    }

    #[test]
    fn test_cli_session_alias() {
        let cli = Cli::try_parse_from(["studytrack", "s", "pause", ID]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Session(SessionArgs {
                command: SessionCommands::Pause { .. }
            })
        ));
    }

    #[test]
    fn test_cli_rejects_bad_id() {
        assert!(Cli::try_parse_from(["studytrack", "session", "start", "nope"]).is_err());
    }

    #[test]
    fn test_cli_create_defaults() {
        let cli = Cli::try_parse_from([
            "studytrack",
            "session",
            "create",
            "--owner",
            ID,
            "--subject",
            "Maths",
            "--tag",
            "exam,week1",
        ])
        .unwrap();

        let Commands::Session(SessionArgs {
            command: SessionCommands::Create(args),
        }) = cli.command
        else {
            panic!("expected session create");
        };
        assert_eq!(args.target, None);
        assert_eq!(args.difficulty, Difficulty::Medium);
        assert_eq!(args.tags, vec!["exam", "week1"]);
    }

    #[test]
    fn test_cli_break_defaults() {
        let cli = Cli::try_parse_from(["studytrack", "session", "break", ID]).unwrap();
        let Commands::Session(SessionArgs {
            command: SessionCommands::Break { duration, kind, .. },
        }) = cli.command
        else {
            panic!("expected session break");
        };
        assert_eq!(duration, 5);
        assert_eq!(kind, BreakKind::Manual);
    }

    #[test]
    fn test_cli_sample_args() {
        let cli = Cli::try_parse_from([
            "studytrack",
            "session",
            "sample",
            ID,
            "--focus",
            "90",
            "--posture",
            "70",
            "--eye-strain",
            "15",
        ])
        .unwrap();
        let Commands::Session(SessionArgs {
            command: SessionCommands::Sample(args),
        }) = cli.command
        else {
            panic!("expected session sample");
        };
        assert!((args.focus - 90.0).abs() < f64::EPSILON);
        assert_eq!(args.distractions, 0);
    }

    #[test]
    fn test_cli_user_report_period() {
        let cli = Cli::try_parse_from(["studytrack", "user", "report", ID, "-p", "month"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::User(UserArgs {
                command: UserCommands::Report {
                    period: ReportPeriod::Month,
                    ..
                }
            })
        ));
    }

    #[test]
    fn test_cli_completions() {
        let cli = Cli::try_parse_from(["studytrack", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }

    #[test]
    fn test_cli_debug_assert() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
