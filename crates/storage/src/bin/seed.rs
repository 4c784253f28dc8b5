use std::fmt;

use chrono::{DateTime, Duration, Utc};
use nexus_core::model::{Profile, ProfileId, QuestionCategory, Quiz, QuizId, QuizQuestion};
use storage::repository::{Storage, StorageError};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    profile_id: ProfileId,
    profile_name: String,
    quizzes: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidProfileId { raw: String },
    InvalidQuizzes { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidProfileId { raw } => write!(f, "invalid --profile-id value: {raw}"),
            ArgsError::InvalidQuizzes { raw } => write!(f, "invalid --quizzes value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("NEXUS_DB_URL").unwrap_or_else(|_| "sqlite:nexus.sqlite3?mode=rwc".into());
        let mut profile_id = std::env::var("NEXUS_PROFILE_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(|| ProfileId::new(1), ProfileId::new);
        let mut profile_name = "Student".to_string();
        let mut quizzes = 2_u32;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--profile-id" => {
                    let value = require_value(&mut args, "--profile-id")?;
                    profile_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidProfileId { raw: value.clone() })?;
                }
                "--name" => {
                    profile_name = require_value(&mut args, "--name")?;
                }
                "--quizzes" => {
                    let value = require_value(&mut args, "--quizzes")?;
                    quizzes = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidQuizzes { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            profile_id,
            profile_name,
            quizzes,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:nexus.sqlite3?mode=rwc)");
    eprintln!("  --profile-id <id>         Profile id to upsert (default: 1)");
    eprintln!("  --name <name>             Profile display name (default: Student)");
    eprintln!("  --quizzes <n>             Number of sample quizzes (default: 2)");
    eprintln!("  --now <rfc3339>           Override the creation timestamp");
}

fn sample_questions() -> Result<Vec<QuizQuestion>, Box<dyn std::error::Error>> {
    let samples = [
        (
            "Which enzyme is chiefly responsible for S-warfarin metabolism?",
            ["CYP2C9", "CYP3A4", "CYP1A2", "CYP2D6"],
            0,
            "S-warfarin, the more potent enantiomer, is cleared mainly by CYP2C9.",
            QuestionCategory::Interaction,
        ),
        (
            "Antidote for paracetamol overdose?",
            ["Naloxone", "Flumazenil", "Acetylcysteine", "Atropine"],
            2,
            "N-acetylcysteine replenishes glutathione stores.",
            QuestionCategory::Clinical,
        ),
        (
            "Mechanism of action of omeprazole?",
            [
                "H2 receptor antagonism",
                "Irreversible H+/K+ ATPase inhibition",
                "Prostaglandin analogue",
                "Antacid neutralisation",
            ],
            1,
            "PPIs bind covalently to the proton pump in parietal cells.",
            QuestionCategory::Mechanism,
        ),
        (
            "Usual adult amoxicillin dose for community-acquired pneumonia?",
            ["250 mg TDS", "500 mg BD", "500 mg TDS", "1 g OD"],
            2,
            "500 mg three times daily (higher doses in severe infection).",
            QuestionCategory::Dosage,
        ),
    ];

    let mut out = Vec::with_capacity(samples.len());
    for (question, options, correct, explanation, category) in samples {
        out.push(QuizQuestion::new(
            question,
            options.iter().map(|o| (*o).to_string()).collect(),
            correct,
            explanation,
            Some(category),
        )?);
    }
    Ok(out)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().inspect_err(|_| print_usage())?;
    let now = args.now.unwrap_or_else(Utc::now);

    let storage = Storage::sqlite(&args.db_url).await?;

    let profile = match storage.profiles.get_profile(args.profile_id).await? {
        Some(existing) => existing,
        None => {
            let profile = Profile::new(args.profile_id, args.profile_name.clone())?;
            storage.profiles.upsert_profile(&profile).await?;
            profile
        }
    };

    let mut inserted = 0_u32;
    for i in 0..args.quizzes {
        let created_at = now - Duration::minutes(i64::from(i));
        let quiz = Quiz::new(
            QuizId::new(u64::from(i + 1)),
            format!("Professional Evaluation: Pharmacology {}", i + 1),
            None,
            sample_questions()?,
            (created_at + Duration::days(7)).date_naive(),
            created_at,
        )?;
        match storage.quizzes.insert_quiz(&quiz).await {
            Ok(()) => inserted += 1,
            Err(StorageError::Conflict) => {}
            Err(err) => return Err(err.into()),
        }
    }

    println!(
        "Seeded profile {} ({}) with {inserted} new quizzes into {}",
        profile.id(),
        profile.name(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
