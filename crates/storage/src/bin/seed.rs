use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use sphere_core::model::{QuestionDraft, QuizDraft};
use storage::repository::{NewQuizRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    file: Option<PathBuf>,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
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
        let mut db_url = std::env::var("SPHERE_DB_URL")
            .unwrap_or_else(|_| "sqlite:study-sphere.sqlite3?mode=rwc".into());
        let mut file = std::env::var("SPHERE_SEED_FILE").ok().map(PathBuf::from);
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
                "--file" => {
                    file = Some(PathBuf::from(require_value(&mut args, "--file")?));
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

        Ok(Self { db_url, file, now })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!(
        "  --db <sqlite_url>         SQLite URL (default: sqlite:study-sphere.sqlite3?mode=rwc)"
    );
    eprintln!("  --file <path>             JSON array of quizzes to import (default: sample bank)");
    eprintln!("  --now <rfc3339>           Fixed creation time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  SPHERE_DB_URL, SPHERE_SEED_FILE");
}

fn question(text: &str, options: [&str; 4], correct: &str) -> QuestionDraft {
    QuestionDraft::new(text, options, correct)
}

fn sample_bank() -> Vec<QuizDraft> {
    vec![
        QuizDraft {
            title: "World Capitals".into(),
            description: Some("Match each country with its capital city.".into()),
            questions: vec![
                question("Capital of France?", ["Paris", "Lyon", "Marseille", "Nice"], "Paris"),
                question("Capital of Japan?", ["Osaka", "Kyoto", "Tokyo", "Nagoya"], "Tokyo"),
                question(
                    "Capital of Australia?",
                    ["Sydney", "Melbourne", "Perth", "Canberra"],
                    "Canberra",
                ),
                question(
                    "Capital of Canada?",
                    ["Toronto", "Ottawa", "Vancouver", "Montreal"],
                    "Ottawa",
                ),
                question(
                    "Capital of Kenya?",
                    ["Nairobi", "Mombasa", "Kisumu", "Nakuru"],
                    "Nairobi",
                ),
                question(
                    "Capital of Brazil?",
                    ["Rio de Janeiro", "Sao Paulo", "Brasilia", "Salvador"],
                    "Brasilia",
                ),
                question("Capital of Egypt?", ["Giza", "Cairo", "Luxor", "Alexandria"], "Cairo"),
            ],
        },
        QuizDraft {
            title: "Basic Chemistry".into(),
            description: None,
            questions: vec![
                question("Symbol for gold?", ["Ag", "Au", "Gd", "Go"], "Au"),
                question("Atomic number of carbon?", ["4", "6", "8", "12"], "6"),
                question("pH of pure water at 25C?", ["5", "6", "7", "8"], "7"),
                question(
                    "Most abundant gas in air?",
                    ["Oxygen", "Nitrogen", "Argon", "CO2"],
                    "Nitrogen",
                ),
                question(
                    "H2O is commonly called?",
                    ["Salt", "Water", "Peroxide", "Ammonia"],
                    "Water",
                ),
                question("Symbol for sodium?", ["So", "Sd", "Na", "Sn"], "Na"),
            ],
        },
    ]
}

fn load_drafts(args: &Args) -> Result<Vec<QuizDraft>, Box<dyn std::error::Error>> {
    match &args.file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(sample_bank()),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let drafts = load_drafts(&args)?;
    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut seeded = 0_usize;
    for draft in drafts {
        let title = draft.title.clone();
        let validated = draft
            .validate(now)
            .map_err(|e| format!("quiz {title:?}: {e}"))?;
        let count = validated.questions.len();
        let id = storage
            .quizzes
            .insert_new_quiz(NewQuizRecord::from_validated(&validated))
            .await?;
        log::info!("seeded quiz {id} ({count} questions)");
        seeded += 1;
    }

    println!("Seeded {seeded} quizzes into {}", args.db_url);

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
