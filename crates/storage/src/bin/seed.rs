use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use signal_core::grading::{QuizSubmission, apply_submission};
use signal_core::model::{
    ActivityDraft, ActivityEventType, ActivityLogEntry, ChapterId, CourseId, User, demo_course,
};
use storage::repository::{Storage, StorageError};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    username: String,
    about_me: Option<String>,
    logins: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidUsername { raw: String },
    InvalidLogins { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUsername { raw } => write!(f, "invalid --user value: {raw:?}"),
            ArgsError::InvalidLogins { raw } => write!(f, "invalid --logins value: {raw}"),
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
        let mut db_url = std::env::var("SIGNAL_DB_URL")
            .unwrap_or_else(|_| "sqlite:signal.sqlite3?mode=rwc".into());
        let mut username = std::env::var("SIGNAL_SEED_USER").unwrap_or_else(|_| "demo".into());
        let mut about_me = std::env::var("SIGNAL_SEED_ABOUT").ok();
        let mut logins = 3;
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
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidUsername { raw: value });
                    }
                    username = value;
                }
                "--about" => {
                    about_me = Some(require_value(&mut args, "--about")?);
                }
                "--logins" => {
                    let value = require_value(&mut args, "--logins")?;
                    logins = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidLogins { raw: value.clone() })?;
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
            username,
            about_me,
            logins,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:signal.sqlite3?mode=rwc)");
    eprintln!("  --user <name>             Learner to create (default: demo)");
    eprintln!("  --about <text>            Learner context stored on the profile");
    eprintln!("  --logins <n>              Number of login events to append (default: 3)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  SIGNAL_DB_URL, SIGNAL_SEED_USER, SIGNAL_SEED_ABOUT");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut user = User::new(&args.username)?;
    if let Some(about) = &args.about_me {
        user = user.with_about_me(about.clone());
    }
    match storage.users.insert_user(&user).await {
        Ok(()) | Err(StorageError::Conflict) => {}
        Err(err) => return Err(err.into()),
    }
    storage.users.upsert_user(&user).await?;

    let course_id = CourseId::new(format!("demo-{}", now.timestamp_millis()));
    let mut course = demo_course(course_id.clone(), now - Duration::days(1));
    course.username = Some(user.username().to_owned());
    // Leave one weak chapter so the dashboard has a gap to show.
    let progress = apply_submission(&course, QuizSubmission::new(ChapterId::new(1), 2));
    course.progress = Some(progress);
    storage.courses.upsert_course(&course, now).await?;

    let owner = user.username();
    storage
        .activity
        .append_log(&ActivityLogEntry::stamped(
            ActivityEventType::GenerateCourse,
            now - Duration::days(1),
            ActivityDraft::for_user(owner)
                .with_course(course_id.clone())
                .with_request(json!({ "topic": "Nursing informatics" })),
        ))
        .await?;
    storage
        .activity
        .append_log(&ActivityLogEntry::stamped(
            ActivityEventType::Search,
            now - Duration::hours(3),
            ActivityDraft::for_user(owner).with_query("clinical vocabularies"),
        ))
        .await?;
    for i in 0..args.logins {
        let at = now - Duration::hours(i64::from(i) * 12);
        storage
            .activity
            .append_log(&ActivityLogEntry::stamped(
                ActivityEventType::Login,
                at,
                ActivityDraft::for_user(owner),
            ))
            .await?;
    }

    println!(
        "Seeded user {} with course {} and {} logins into {}",
        owner, course_id, args.logins, args.db_url
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
