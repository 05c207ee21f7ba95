mod play;
mod render;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::debug;
use services::{AppServices, Clock, Sampling};
use sphere_core::SessionSettings;
use sphere_core::model::QuizId;
use sphere_core::session::{
    DEFAULT_QUESTIONS_PER_SESSION, DEFAULT_REVEAL_DELAY_MS, DEFAULT_TIME_LIMIT_SECS,
};

const DEFAULT_DB_URL: &str = "sqlite://study-sphere.sqlite3";

#[derive(Parser, Debug)]
#[command(name = "study-sphere", about = "Timed multiple-choice quizzes", version)]
struct Cli {
    /// SQLite database URL or file path
    #[arg(long, global = true, env = "SPHERE_DB_URL", default_value = DEFAULT_DB_URL)]
    db: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output format for listings
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List quizzes in the bank
    List {
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },

    /// Take a timed attempt at a quiz
    Play {
        quiz_id: QuizId,
        /// Seed for reproducible question sampling
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = DEFAULT_QUESTIONS_PER_SESSION)]
        questions: u32,
        /// Time limit in seconds
        #[arg(long, default_value_t = DEFAULT_TIME_LIMIT_SECS)]
        time_limit: u32,
        /// How long the answer highlight stays before moving on, in ms
        #[arg(long, default_value_t = DEFAULT_REVEAL_DELAY_MS)]
        reveal_ms: u32,
    },

    /// Show recent attempts for a quiz
    History {
        quiz_id: QuizId,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Delete a quiz and its attempt history
    Delete { quiz_id: QuizId },
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| format!("invalid database url: {db_url}"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(format!("invalid database url: {db_url}").into());
    }

    let path = Path::new(path);
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

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_url = normalize_sqlite_url(&cli.db);

    // Open + migrate SQLite here so core and services stay storage-agnostic.
    prepare_sqlite_file(&db_url)?;
    debug!("using database {db_url}");

    match cli.command {
        Command::List { limit } => {
            let services = open(&db_url, Sampling::Entropy, SessionSettings::standard()).await?;
            let quizzes = services.quizzes().list_quizzes(limit).await?;
            render::print_quiz_list(&quizzes, cli.format)?;
        }
        Command::Play {
            quiz_id,
            seed,
            questions,
            time_limit,
            reveal_ms,
        } => {
            let settings = SessionSettings::new(questions, time_limit, reveal_ms)?;
            let services = open(&db_url, Sampling::from_seed(seed), settings).await?;
            play::run(&services.sessions(), quiz_id).await?;
        }
        Command::History { quiz_id, limit } => {
            let services = open(&db_url, Sampling::Entropy, SessionSettings::standard()).await?;
            let quiz = services.quizzes().get_quiz(quiz_id).await?;
            let history = services.history();
            let recent = history.list_recent(quiz_id, limit).await?;
            let best = history.best_attempt(quiz_id).await?;
            render::print_history(&quiz, &recent, best.as_ref(), cli.format)?;
        }
        Command::Delete { quiz_id } => {
            let services = open(&db_url, Sampling::Entropy, SessionSettings::standard()).await?;
            services.quizzes().delete_quiz(quiz_id).await?;
            println!("Deleted quiz {quiz_id}");
        }
    }

    Ok(())
}

async fn open(
    db_url: &str,
    sampling: Sampling,
    settings: SessionSettings,
) -> Result<AppServices, Box<dyn std::error::Error>> {
    Ok(AppServices::new_sqlite(db_url, Clock::default_clock(), sampling, settings).await?)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level.as_str())).init();

    if let Err(err) = run(cli).await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
