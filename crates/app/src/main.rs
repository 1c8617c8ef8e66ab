mod presenter;

use std::fmt;

use lingua_core::model::{LanguageCode, LearnerProfile, StepId};
use services::{AppServices, Clock, ServiceConfig, StepController, StepEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use presenter::Command;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidTarget { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTarget { raw } => write!(f, "unknown --target language: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  lingualink [--db <sqlite_url>] [--target <language>] [--verbose]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://lingualink.sqlite3");
    eprintln!("  --target es");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  GEMINI_API_KEY (required), LINGUA_DB_URL, LINGUA_GEMINI_MODEL,");
    eprintln!("  LINGUA_GEMINI_BASE_URL, LINGUA_TRANSLATE_BASE_URL, LINGUA_HTTP_TIMEOUT_SECS,");
    eprintln!("  LINGUA_QUIZ_QUESTIONS, LINGUA_MAX_TURNS, RUST_LOG");
}

#[derive(Debug)]
struct Args {
    db_url: String,
    target: LanguageCode,
    verbose: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut db_url = std::env::var("LINGUA_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://lingualink.sqlite3".into(), normalize_sqlite_url);
        let mut target = LanguageCode::default_target();
        let mut verbose = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--target" => {
                    let value = require_value(args, "--target")?;
                    target = LanguageCode::resolve(&value)
                        .ok_or(ArgsError::InvalidTarget { raw: value })?;
                }
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Some(Self {
            db_url,
            target,
            verbose,
        }))
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
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

fn init_tracing(verbose: bool) {
    // RUST_LOG wins over --verbose.
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let Some(args) = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?
    else {
        print_usage();
        return Ok(());
    };

    init_tracing(args.verbose);
    let config = ServiceConfig::from_env()?;
    tracing::debug!(?config, db = %args.db_url, "configuration loaded");

    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, config, Clock::system()).await?;
    let controller =
        services.new_session(LearnerProfile::default().with_target_language(args.target));
    tracing::info!(session = %controller.session().id(), "session started");

    run_session(controller).await
}

fn show_step(controller: &StepController) {
    println!(
        "{}",
        presenter::render_step(controller.session(), controller.config().quiz_questions)
    );
}

async fn run_session(mut controller: StepController) -> Result<(), Box<dyn std::error::Error>> {
    println!("Welcome to LinguaLink. Type :help for commands.");
    show_step(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match presenter::parse_line(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("! {message}");
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => println!("{}", presenter::help()),
            Command::Stats => println!("{}", presenter::render_analytics(&controller.analytics())),
            Command::Profile(edit) => {
                let updated = presenter::edited_profile(controller.session().profile(), &edit)
                    .map_err(|message| format!("! {message}"))
                    .and_then(|profile| {
                        controller
                            .update_profile(profile)
                            .map_err(|err| presenter::render_error(&err))
                    });
                match updated {
                    Ok(()) => show_step(&controller),
                    Err(message) => println!("{message}"),
                }
            }
            Command::Step(action) => {
                let event = StepEvent::new(controller.current_step(), action);
                match controller.handle(event).await {
                    Ok(report) => {
                        let feedback = presenter::render_report(&report);
                        if !feedback.is_empty() {
                            println!("{feedback}");
                        }
                        if report.current_step == StepId::Analytics {
                            println!("{}", presenter::render_analytics(&controller.analytics()));
                        }
                        if report.transitioned() || report.current_step == StepId::Quiz {
                            show_step(&controller);
                        }
                    }
                    Err(err) => println!("{}", presenter::render_error(&err)),
                }
            }
        }
    }

    let session = controller.into_session();
    tracing::info!(
        session = %session.id(),
        turns = session.turns().len(),
        "session finished"
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
