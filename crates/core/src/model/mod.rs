mod activity;
mod course;
mod demo;
mod ids;
mod progress;
mod quiz;
mod remediation;
mod user;
mod verification;

pub use ids::{ChapterId, CourseId, ParseIdError};

pub use activity::{ActivityDraft, ActivityEventType, ActivityLogEntry};
pub use course::{
    ANONYMOUS_USER, Chapter, Course, CourseError, Flashcard, GENERATED_CHAPTER_COUNT,
    OPTIONS_PER_QUESTION, QUESTIONS_PER_CHAPTER, QuizHistory,
};
pub use demo::{DEMO_TOPIC, demo_course, is_demo_topic};
pub use progress::CourseProgress;
pub use quiz::{QuizAnswer, QuizAttempt, QuizQuestion};
pub use remediation::{
    MAX_REMEDIATION_QUESTIONS, MIN_REMEDIATION_QUESTIONS, Remediation, RemediationError,
};
pub use user::{User, UserError};
pub use verification::{
    MANUAL_REVIEW_NOTE, REFINEMENT_THRESHOLD, Verification, VerificationError,
    VerificationStatus,
};

#[cfg(test)]
pub(crate) use course::fixtures;
