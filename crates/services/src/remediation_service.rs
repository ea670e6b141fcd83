use std::sync::Arc;

use signal_core::model::{ChapterId, Course, QuizAttempt, Remediation};
use tracing::{debug, info};

use crate::ai::Remediator;
use crate::error::RemediationError;

/// Follow-up quizzes for chapters a learner did not master.
#[derive(Clone)]
pub struct RemediationService {
    remediator: Arc<dyn Remediator>,
}

impl RemediationService {
    #[must_use]
    pub fn new(remediator: Arc<dyn Remediator>) -> Self {
        Self { remediator }
    }

    /// Build a remediation for the questions missed in `attempt` on `chapter_id`.
    ///
    /// # Errors
    ///
    /// Returns `RemediationError::NothingMissed` for a perfect attempt.
    /// Returns `RemediationError::ChapterNotFound` if the chapter is not in the course.
    /// Returns `RemediationError::Failed` if the collaborator fails or replies badly.
    pub async fn remediate(
        &self,
        course: &Course,
        chapter_id: ChapterId,
        attempt: &QuizAttempt,
    ) -> Result<Remediation, RemediationError> {
        let missed = attempt.missed_questions();
        if missed.is_empty() {
            return Err(RemediationError::NothingMissed);
        }
        let chapter = course
            .chapter(chapter_id)
            .ok_or(RemediationError::ChapterNotFound(chapter_id))?;

        debug!(course_id = %course.course_id, chapter = %chapter_id, missed = missed.len(), "requesting remediation");
        let remediation = self.remediator.remediate(chapter, &missed).await?;
        info!(
            course_id = %course.course_id,
            chapter = %chapter_id,
            questions = remediation.questions().len(),
            "remediation ready"
        );
        Ok(remediation)
    }
}
