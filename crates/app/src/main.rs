use std::fmt;
use std::io::BufRead;

use services::{AppServices, Clock};
use signal_core::model::{
    ChapterId, Course, CourseProgress, QuizAttempt, QuizHistory, QuizQuestion, is_demo_topic,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod render;

use cli::{Args, Command, CourseCommand, print_usage};
use config::{AppConfig, DEFAULT_LOG_FILTER, prepare_sqlite_file};

#[derive(Debug)]
enum RunError {
    NoAttempt(ChapterId),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::NoAttempt(id) => {
                write!(f, "no quiz attempt recorded for chapter {id}; run `submit` first")
            }
        }
    }
}

impl std::error::Error for RunError {}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Re-grade the stored answers for `chapter_id`.
fn last_attempt(course: &Course, chapter_id: ChapterId) -> Result<QuizAttempt, RunError> {
    let answers = course
        .quiz_history
        .as_ref()
        .and_then(|history| history.get(&chapter_id))
        .filter(|answers| !answers.is_empty())
        .ok_or(RunError::NoAttempt(chapter_id))?;
    let questions: Vec<QuizQuestion> = answers.iter().map(|a| a.question.clone()).collect();
    let selections: Vec<Option<usize>> = answers.iter().map(|a| a.selected_option).collect();
    Ok(QuizAttempt::grade(&questions, &selections))
}

/// One answer per line from stdin; blank, unparsable or missing lines are unanswered.
fn read_selections(count: usize) -> Vec<Option<usize>> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    (0..count)
        .map(|_| {
            lines
                .next()
                .and_then(Result::ok)
                .and_then(|line| line.trim().parse::<usize>().ok())
        })
        .collect()
}

async fn run_course_command(
    app: &AppServices,
    course_id: &signal_core::model::CourseId,
    action: CourseCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let courses = app.courses();
    let course = match action {
        CourseCommand::Show => courses.get_course(course_id).await?,
        CourseCommand::SetUsername { username } => courses.set_owner(course_id, &username).await?,
        CourseCommand::FixMissingUsername { username } => {
            match courses.fix_missing_owner(course_id, &username).await? {
                Some(course) => course,
                None => {
                    println!("{course_id} already has an owner; nothing changed.");
                    return Ok(());
                }
            }
        }
        CourseCommand::SetQuiz { file } => {
            let history: QuizHistory = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            courses.replace_quiz_history(course_id, history).await?
        }
        CourseCommand::PatchProgress { file } => {
            let progress: CourseProgress = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            courses.replace_progress(course_id, progress).await?
        }
    };
    println!("{}", serde_json::to_string_pretty(&course)?);
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite in the binary glue; services never see file paths.
    let config = AppConfig::resolve(args.db_url)?;
    prepare_sqlite_file(&config.db_url)?;
    let app = AppServices::new_sqlite(&config.db_url, Clock::default_clock(), config.ai).await?;
    info!(db = %config.db_url, ai = app.ai_enabled(), "services ready");

    match args.command {
        Command::Dashboard => {
            let dashboard = app.insights().dashboard().await?;
            render::dashboard(&dashboard);
        }
        Command::Login { username } => {
            let user = app.users().login(&username).await?;
            println!("Signed in as {}", user.username());
        }
        Command::Profile { username, about_me } => {
            let user = app.users().update_profile(&username, &about_me).await?;
            println!("Saved profile for {}", user.username());
        }
        Command::Generate { username, topic } => {
            let user = app.users().get_user(&username).await?;
            if !app.ai_enabled() && !is_demo_topic(&topic) {
                warn!("SIGNAL_AI_API_KEY is not set; only the demo topic can be generated");
            }
            let course = app.generation().generate_course(&topic, &user).await?;
            render::course_created(&course);
        }
        Command::Courses { username } => {
            let courses = app.courses().courses_for_user(&username).await?;
            render::course_list(&courses);
        }
        Command::Submit {
            course_id,
            chapter_id,
            answers,
        } => {
            let outcome = app
                .courses()
                .submit_quiz(&course_id, chapter_id, &answers)
                .await?;
            render::quiz_outcome(&outcome);
        }
        Command::Remediate {
            course_id,
            chapter_id,
        } => {
            let course = app.courses().get_course(&course_id).await?;
            let attempt = last_attempt(&course, chapter_id)?;
            let remediation = app
                .remediation()
                .remediate(&course, chapter_id, &attempt)
                .await?;
            render::remediation(&remediation);

            println!();
            println!("Answer with one option number per line:");
            let selections = read_selections(remediation.questions().len());
            let retry = QuizAttempt::grade(remediation.questions(), &selections);
            if retry.is_mastery() {
                let course = app
                    .courses()
                    .complete_remediation(&course_id, chapter_id)
                    .await?;
                println!("Mastered. Chapter {chapter_id} now counts in full.");
                render::course_list(std::slice::from_ref(&course));
            } else {
                println!(
                    "{}/{} correct. Review the explanation and try again.",
                    retry.score(),
                    retry.question_count()
                );
            }
        }
        Command::Course { course_id, action } => {
            run_course_command(&app, &course_id, action).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
