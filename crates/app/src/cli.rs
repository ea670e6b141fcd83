use std::fmt;
use std::path::PathBuf;

use signal_core::model::{ChapterId, CourseId};

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { command: &'static str, flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    MissingCommand,
    InvalidDbUrl { raw: String },
    InvalidChapter { raw: String },
    InvalidAnswers { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { command, flag } => write!(f, "{command} requires {flag}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingCommand => write!(f, "a subcommand is required"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidChapter { raw } => write!(f, "invalid --chapter value: {raw}"),
            ArgsError::InvalidAnswers { raw } => {
                write!(f, "invalid --answers value (expected e.g. 0,2,_,1): {raw}")
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

/// Maintenance edits on one stored course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseCommand {
    Show,
    SetUsername { username: String },
    FixMissingUsername { username: String },
    SetQuiz { file: PathBuf },
    PatchProgress { file: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dashboard,
    Login { username: String },
    Profile { username: String, about_me: String },
    Generate { username: String, topic: String },
    Courses { username: String },
    Submit {
        course_id: CourseId,
        chapter_id: ChapterId,
        answers: Vec<Option<usize>>,
    },
    Remediate {
        course_id: CourseId,
        chapter_id: ChapterId,
    },
    Course {
        course_id: CourseId,
        action: CourseCommand,
    },
}

/// Parsed command line. `db_url` is the raw `--db` override, if given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_url: Option<String>,
    pub command: Command,
}

/// Flag values collected before the command decides which ones it needs.
#[derive(Default)]
struct Flags {
    user: Option<String>,
    about: Option<String>,
    topic: Option<String>,
    course: Option<String>,
    chapter: Option<String>,
    answers: Option<String>,
    file: Option<String>,
}

impl Flags {
    fn take(
        value: Option<String>,
        command: &'static str,
        flag: &'static str,
    ) -> Result<String, ArgsError> {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or(ArgsError::MissingFlag { command, flag })
    }

    fn course_id(&mut self, command: &'static str) -> Result<CourseId, ArgsError> {
        Self::take(self.course.take(), command, "--course").map(|raw| CourseId::new(raw.trim()))
    }

    fn chapter_id(&mut self, command: &'static str) -> Result<ChapterId, ArgsError> {
        let raw = Self::take(self.chapter.take(), command, "--chapter")?;
        raw.trim()
            .parse::<ChapterId>()
            .map_err(|_| ArgsError::InvalidChapter { raw })
    }
}

/// Parse `0,2,_,1` into selections; `_`, `-` and empty slots are unanswered.
///
/// # Errors
///
/// Returns `ArgsError::InvalidAnswers` if a slot is not an option index.
pub fn parse_answers(raw: &str) -> Result<Vec<Option<usize>>, ArgsError> {
    raw.split(',')
        .map(str::trim)
        .map(|slot| match slot {
            "" | "_" | "-" => Ok(None),
            n => n.parse::<usize>().map(Some).map_err(|_| ArgsError::InvalidAnswers {
                raw: raw.to_owned(),
            }),
        })
        .collect()
}

impl Args {
    /// Parse process arguments (without the program name).
    ///
    /// # Errors
    ///
    /// Returns `ArgsError` for unknown commands or flags and missing values.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut args = args.into_iter();
        let mut db_url = None;
        let mut words = Vec::new();
        let mut flags = Flags::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(value);
                }
                "--user" => flags.user = Some(require_value(&mut args, "--user")?),
                "--about" => flags.about = Some(require_value(&mut args, "--about")?),
                "--topic" => flags.topic = Some(require_value(&mut args, "--topic")?),
                "--course" => flags.course = Some(require_value(&mut args, "--course")?),
                "--chapter" => flags.chapter = Some(require_value(&mut args, "--chapter")?),
                "--answers" => flags.answers = Some(require_value(&mut args, "--answers")?),
                "--file" => flags.file = Some(require_value(&mut args, "--file")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
                _ => words.push(arg),
            }
        }

        let command = Self::command(&words, flags)?;
        Ok(Self { db_url, command })
    }

    fn command(words: &[String], mut flags: Flags) -> Result<Command, ArgsError> {
        let Some((first, rest)) = words.split_first() else {
            return Err(ArgsError::MissingCommand);
        };
        let expect_no_more = |rest: &[String]| match rest.first() {
            Some(extra) => Err(ArgsError::UnknownArg(extra.clone())),
            None => Ok(()),
        };

        let command = match first.as_str() {
            "dashboard" => Command::Dashboard,
            "login" => Command::Login {
                username: Flags::take(flags.user, "login", "--user")?,
            },
            "profile" => Command::Profile {
                username: Flags::take(flags.user, "profile", "--user")?,
                about_me: flags.about.unwrap_or_default(),
            },
            "generate" => Command::Generate {
                username: Flags::take(flags.user, "generate", "--user")?,
                topic: Flags::take(flags.topic, "generate", "--topic")?,
            },
            "courses" => Command::Courses {
                username: Flags::take(flags.user, "courses", "--user")?,
            },
            "submit" => {
                let course_id = flags.course_id("submit")?;
                let chapter_id = flags.chapter_id("submit")?;
                let raw = Flags::take(flags.answers, "submit", "--answers")?;
                Command::Submit {
                    course_id,
                    chapter_id,
                    answers: parse_answers(&raw)?,
                }
            }
            "remediate" => Command::Remediate {
                course_id: flags.course_id("remediate")?,
                chapter_id: flags.chapter_id("remediate")?,
            },
            "course" => {
                let (action, rest) = rest.split_first().ok_or(ArgsError::MissingCommand)?;
                expect_no_more(rest)?;
                let course_id = flags.course_id("course")?;
                let action = match action.as_str() {
                    "show" => CourseCommand::Show,
                    "set-username" => CourseCommand::SetUsername {
                        username: Flags::take(flags.user, "course set-username", "--user")?,
                    },
                    "fix-missing-username" => CourseCommand::FixMissingUsername {
                        username: Flags::take(flags.user, "course fix-missing-username", "--user")?,
                    },
                    "set-quiz" => CourseCommand::SetQuiz {
                        file: Flags::take(flags.file, "course set-quiz", "--file")?.into(),
                    },
                    "patch-progress" => CourseCommand::PatchProgress {
                        file: Flags::take(flags.file, "course patch-progress", "--file")?.into(),
                    },
                    other => return Err(ArgsError::UnknownCommand(format!("course {other}"))),
                };
                return Ok(Command::Course { course_id, action });
            }
            other => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };
        expect_no_more(rest)?;
        Ok(command)
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- <command> [--db <sqlite_url>] [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  dashboard                                   Admin view of learners and topics");
    eprintln!("  login     --user <name>                     Sign in, creating the learner if new");
    eprintln!("  profile   --user <name> --about <text>      Set the learner's \"about me\"");
    eprintln!("  generate  --user <name> --topic <topic>     Generate a course (topic \"test\" = demo)");
    eprintln!("  courses   --user <name>                     List a learner's courses");
    eprintln!("  submit    --course <id> --chapter <n> --answers <0,2,_,1>");
    eprintln!("  remediate --course <id> --chapter <n>       Follow-up quiz on missed questions");
    eprintln!("  course show|set-username|fix-missing-username|set-quiz|patch-progress");
    eprintln!("            --course <id> [--user <name>] [--file <json>]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SIGNAL_DB_URL (default sqlite://signal.sqlite3)");
    eprintln!("  SIGNAL_AI_API_KEY, SIGNAL_AI_BASE_URL, SIGNAL_AI_MODEL");
    eprintln!("  RUST_LOG (default app=info,services=info,storage=warn)");
}
