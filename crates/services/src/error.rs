//! Shared error types for the services crate.

use thiserror::Error;

use signal_core::model::{
    ChapterId, CourseError, RemediationError as InvalidRemediation, UserError, VerificationError,
};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the AI chat client and its collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AiError {
    #[error("AI collaborators are not configured")]
    Disabled,
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("model request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("model returned malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error(transparent)]
    Remediation(#[from] InvalidRemediation),
}

/// Underlying reason a generation step failed. Kept as the error source for logs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationCause {
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error("generated course has the wrong shape: {0}")]
    Shape(#[from] CourseError),
}

/// Errors emitted by `GenerationService`.
///
/// Every collaborator failure displays the same message; store failures stay distinct.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("topic is required")]
    EmptyTopic,
    #[error("course generation failed")]
    Failed(#[source] GenerationCause),
    #[error(transparent)]
    Course(#[from] CourseServiceError),
}

impl From<AiError> for GenerationError {
    fn from(err: AiError) -> Self {
        Self::Failed(err.into())
    }
}

impl From<CourseError> for GenerationError {
    fn from(err: CourseError) -> Self {
        Self::Failed(err.into())
    }
}

/// Errors emitted by `RemediationService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemediationError {
    #[error("attempt has no missed questions")]
    NothingMissed,
    #[error("chapter {0} not found in course")]
    ChapterNotFound(ChapterId),
    #[error("remediation generation failed")]
    Failed(#[source] GenerationCause),
}

impl From<AiError> for RemediationError {
    fn from(err: AiError) -> Self {
        Self::Failed(err.into())
    }
}

/// Errors emitted by `CourseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServiceError {
    #[error("chapter {0} not found in course")]
    ChapterNotFound(ChapterId),
    #[error("username cannot be empty")]
    MissingOwner,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `InsightsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InsightsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
