use clap::Parser;
use colored::Colorize;

use studytrack::cli::args::{Cli, Commands};
use studytrack::cli::commands;
use studytrack::config::Config;
use studytrack::error::TrackerError;
use studytrack::features::session::{LogSink, SessionManager, SqliteStore};
use studytrack::storage::Database;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        if !e.is_user_error() {
            log::debug!("{e:?}");
            eprintln!("{}", "run with -vv for details".dimmed());
        }
        std::process::exit(1);
    }
}

/// `warn` by default, raised by each `-v`; `RUST_LOG` wins when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<(), TrackerError> {
    let config = Config::load()?;
    config.general.color.apply();
    let format = cli.output.unwrap_or(config.general.default_output);

    if let Commands::Completions { shell } = cli.command {
        print!("{}", commands::completions(shell)?);
        return Ok(());
    }

    let db = match &cli.db {
        Some(path) => Database::open_at(path)?,
        None => Database::open()?,
    };
    let manager = SessionManager::new(SqliteStore::new(db), LogSink).with_config(&config);

    let output = match cli.command {
        Commands::User(args) => commands::user(&manager, args.command, format)?,
        Commands::Session(args) => commands::session(&manager, args.command, &config, format)?,
        Commands::Report { session, points } => {
            commands::report(&manager, session, points, format)?
        }
        Commands::Completions { .. } => String::new(),
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
