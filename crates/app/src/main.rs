use std::fmt;

use chrono::NaiveDate;
use nexus_core::model::{ProfileId, QuizId};
use services::{AppConfig, AppServices, ConfigOverrides, WritePolicy};

mod commands;

#[derive(Debug)]
enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingValue { flag: &'static str },
    MissingPath,
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidProfileId { raw: String },
    InvalidQuizId { raw: String },
    InvalidWritePolicy { raw: String },
    InvalidDate { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "a subcommand is required"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingPath => write!(f, "render requires a file path (or `-` for stdin)"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidProfileId { raw } => write!(f, "invalid --profile-id value: {raw}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid quiz id: {raw}"),
            ArgsError::InvalidWritePolicy { raw } => {
                write!(f, "invalid --write-policy value (optimistic|confirmed): {raw}")
            }
            ArgsError::InvalidDate { raw } => {
                write!(f, "invalid --date value (expected YYYY-MM-DD): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Render { path: String, json: bool },
    Quiz { id: Option<QuizId> },
    Dashboard { date: Option<NaiveDate> },
}

struct Args {
    command: Command,
    overrides: ConfigOverrides,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- render <file|-> [--json]");
    eprintln!("  cargo run -p app -- quiz [<id>] [options]");
    eprintln!("  cargo run -p app -- dashboard [--date <YYYY-MM-DD>] [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>           SQLite URL (default: sqlite://nexus.sqlite3)");
    eprintln!("  --profile-id <id>           Learner profile (default: 1)");
    eprintln!("  --write-policy <policy>     optimistic | confirmed (default: optimistic)");
    eprintln!();
    eprintln!("Environment (also read from .env):");
    eprintln!("  NEXUS_DB_URL, NEXUS_PROFILE_ID, NEXUS_WRITE_POLICY, RUST_LOG");
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let name = args.next().ok_or(ArgsError::MissingCommand)?;
        if name == "--help" || name == "-h" {
            print_usage();
            std::process::exit(0);
        }

        let mut overrides = ConfigOverrides::default();
        let mut positional: Option<String> = None;
        let mut json = false;
        let mut date: Option<NaiveDate> = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    overrides.database_url = Some(value);
                }
                "--profile-id" => {
                    let value = require_value(&mut args, "--profile-id")?;
                    let parsed: ProfileId = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidProfileId { raw: value.clone() })?;
                    overrides.profile_id = Some(parsed);
                }
                "--write-policy" => {
                    let value = require_value(&mut args, "--write-policy")?;
                    let parsed: WritePolicy = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidWritePolicy { raw: value.clone() })?;
                    overrides.write_policy = Some(parsed);
                }
                "--json" if name == "render" => json = true,
                "--date" if name == "dashboard" => {
                    let value = require_value(&mut args, "--date")?;
                    let parsed = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                        .map_err(|_| ArgsError::InvalidDate { raw: value.clone() })?;
                    date = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if positional.is_none() && (arg == "-" || !arg.starts_with('-')) => {
                    positional = Some(arg);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match name.as_str() {
            "render" => Command::Render {
                path: positional.ok_or(ArgsError::MissingPath)?,
                json,
            },
            "quiz" => {
                let id = positional
                    .map(|raw| {
                        raw.parse::<QuizId>()
                            .map_err(|_| ArgsError::InvalidQuizId { raw: raw.clone() })
                    })
                    .transpose()?;
                Command::Quiz { id }
            }
            "dashboard" => match positional {
                Some(extra) => return Err(ArgsError::UnknownArg(extra)),
                None => Command::Dashboard { date },
            },
            _ => return Err(ArgsError::UnknownCommand(name)),
        };

        Ok(Self { command, overrides })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).inspect_err(|_| print_usage())?;

    let config = AppConfig::load(args.overrides)?;
    pretty_env_logger::init();
    log::debug!(
        "config: db={} profile={} write_policy={}",
        config.database_url,
        config.profile_id,
        config.write_policy
    );

    if let Command::Render { path, json } = &args.command {
        return commands::render_file(path, *json);
    }

    // Open + migrate SQLite here so the library crates never touch the filesystem layout.
    prepare_sqlite_file(&config.database_url)?;
    let app = AppServices::new_sqlite(&config).await?;

    match args.command {
        Command::Render { .. } => Ok(()),
        Command::Quiz { id: None } => commands::list_quizzes(&app).await,
        Command::Quiz { id: Some(id) } => commands::take_quiz(&app, id).await,
        Command::Dashboard { date } => {
            let date = date.unwrap_or_else(|| services::Clock::default().today());
            commands::dashboard(&app, date).await
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.contains("mode=memory") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
