use std::sync::Arc;

use serde_json::{Value, json};
use signal_core::grading::{QuizSubmission, apply_submission};
use signal_core::model::{
    ActivityDraft, ActivityEventType, ChapterId, Course, CourseId, CourseProgress, QuizAttempt,
    QuizHistory,
};
use storage::repository::CourseRepository;
use tracing::info;

use crate::Clock;
use crate::activity_service::ActivityService;
use crate::error::CourseServiceError;

/// Result of grading one chapter quiz.
#[derive(Debug, Clone)]
pub struct QuizOutcome {
    /// The course as stored after the submission.
    pub course: Course,
    pub attempt: QuizAttempt,
    /// Chapter to open next, if any.
    pub next_chapter: Option<ChapterId>,
}

impl QuizOutcome {
    /// The submitted chapter was the last one.
    #[must_use]
    pub fn finished_course(&self) -> bool {
        self.next_chapter.is_none()
    }
}

/// Persists courses and folds quiz results into their progress.
#[derive(Clone)]
pub struct CourseService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    activity: ActivityService,
}

impl CourseService {
    #[must_use]
    pub fn new(clock: Clock, courses: Arc<dyn CourseRepository>, activity: ActivityService) -> Self {
        Self {
            clock,
            courses,
            activity,
        }
    }

    /// Upsert `course` under `username`, log it, and return the stored copy.
    ///
    /// Courses carrying quiz history are logged as `quiz_submit`, anything else
    /// as `generate_course`.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::MissingOwner` for a blank username.
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn save_course(
        &self,
        course: Course,
        username: &str,
    ) -> Result<Course, CourseServiceError> {
        self.save_with_request(course, username, None).await
    }

    /// Like [`save_course`](Self::save_course), recording the generation request on the log entry.
    ///
    /// # Errors
    ///
    /// Same as [`save_course`](Self::save_course).
    pub async fn save_generated(
        &self,
        course: Course,
        username: &str,
        topic: &str,
    ) -> Result<Course, CourseServiceError> {
        self.save_with_request(course, username, Some(json!({ "topic": topic })))
            .await
    }

    async fn save_with_request(
        &self,
        mut course: Course,
        username: &str,
        request: Option<Value>,
    ) -> Result<Course, CourseServiceError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CourseServiceError::MissingOwner);
        }
        course.username = Some(username.to_owned());
        self.courses.upsert_course(&course, self.clock.now()).await?;

        let mut draft = ActivityDraft::for_user(username).with_course(course.course_id.clone());
        if let Some(request) = request {
            draft = draft.with_request(request);
        }
        let event_type = if let Some(history) = course.quiz_history.as_ref().filter(|h| !h.is_empty()) {
            draft = draft.with_response(json!({ "quizEntries": history.len() }));
            ActivityEventType::QuizSubmit
        } else {
            draft = draft.with_response(json!({
                "title": course.title,
                "chapters": course.chapters.len(),
            }));
            ActivityEventType::GenerateCourse
        };
        let entry = self.activity.log_event(event_type, draft).await?;
        info!(course_id = %course.course_id, user = username, event = %entry.event_type, "course saved");

        Ok(self.courses.get_course(&course.course_id).await?)
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` (including `NotFound`) on failure.
    pub async fn get_course(&self, id: &CourseId) -> Result<Course, CourseServiceError> {
        Ok(self.courses.get_course(id).await?)
    }

    /// The learner's library, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn courses_for_user(&self, username: &str) -> Result<Vec<Course>, CourseServiceError> {
        Ok(self.courses.courses_for_user(username.trim()).await?)
    }

    /// Grade `selections` for one chapter, update progress and history, and persist.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::ChapterNotFound` if the chapter is not in the course.
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn submit_quiz(
        &self,
        course_id: &CourseId,
        chapter_id: ChapterId,
        selections: &[Option<usize>],
    ) -> Result<QuizOutcome, CourseServiceError> {
        let mut course = self.courses.get_course(course_id).await?;
        let chapter = course
            .chapter(chapter_id)
            .ok_or(CourseServiceError::ChapterNotFound(chapter_id))?;
        let attempt = QuizAttempt::grade(&chapter.quiz, selections);
        let next_chapter = course.next_chapter(chapter_id).map(|c| c.id);

        let progress = apply_submission(&course, QuizSubmission::from_attempt(chapter_id, &attempt));
        course.progress = Some(progress);
        course.record_answers(chapter_id, attempt.answers().to_vec());

        let owner = course.owner().to_owned();
        let course = self.save_course(course, &owner).await?;
        Ok(QuizOutcome {
            course,
            attempt,
            next_chapter,
        })
    }

    /// Credit full marks for a chapter mastered through remediation.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::ChapterNotFound` if the chapter is not in the course.
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn complete_remediation(
        &self,
        course_id: &CourseId,
        chapter_id: ChapterId,
    ) -> Result<Course, CourseServiceError> {
        let mut course = self.courses.get_course(course_id).await?;
        let chapter = course
            .chapter(chapter_id)
            .ok_or(CourseServiceError::ChapterNotFound(chapter_id))?;
        let progress = apply_submission(&course, QuizSubmission::mastered(chapter));
        course.progress = Some(progress);

        let saved = self.persist(&course).await?;
        self.activity
            .log_event(
                ActivityEventType::Remediation,
                ActivityDraft::for_user(saved.owner()).with_course(course_id.clone()),
            )
            .await?;
        info!(course_id = %course_id, chapter = %chapter_id, "remediation credited");
        Ok(saved)
    }

    /// Upsert and read back without touching the activity log.
    async fn persist(&self, course: &Course) -> Result<Course, CourseServiceError> {
        self.courses.upsert_course(course, self.clock.now()).await?;
        Ok(self.courses.get_course(&course.course_id).await?)
    }

    //
    // ─── MAINTENANCE ───────────────────────────────────────────────────────────
    //
    // Direct document edits. These bypass the activity log.

    async fn rewrite(
        &self,
        id: &CourseId,
        edit: impl FnOnce(&mut Course),
    ) -> Result<Course, CourseServiceError> {
        let mut course = self.courses.get_course(id).await?;
        edit(&mut course);
        let course = self.persist(&course).await?;
        info!(course_id = %id, "course document rewritten");
        Ok(course)
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::MissingOwner` for a blank username.
    /// Returns `CourseServiceError::Storage` (including `NotFound`) on failure.
    pub async fn set_owner(&self, id: &CourseId, username: &str) -> Result<Course, CourseServiceError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CourseServiceError::MissingOwner);
        }
        self.rewrite(id, |c| c.username = Some(username.to_owned()))
            .await
    }

    /// Set the owner only when the course has none. Returns `None` when it already had one.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::MissingOwner` for a blank username.
    /// Returns `CourseServiceError::Storage` (including `NotFound`) on failure.
    pub async fn fix_missing_owner(
        &self,
        id: &CourseId,
        username: &str,
    ) -> Result<Option<Course>, CourseServiceError> {
        let course = self.courses.get_course(id).await?;
        if course.username.as_deref().is_some_and(|u| !u.trim().is_empty()) {
            return Ok(None);
        }
        self.set_owner(id, username).await.map(Some)
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` (including `NotFound`) on failure.
    pub async fn replace_quiz_history(
        &self,
        id: &CourseId,
        history: QuizHistory,
    ) -> Result<Course, CourseServiceError> {
        self.rewrite(id, |c| c.quiz_history = Some(history)).await
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` (including `NotFound`) on failure.
    pub async fn replace_progress(
        &self,
        id: &CourseId,
        progress: CourseProgress,
    ) -> Result<Course, CourseServiceError> {
        self.rewrite(id, |c| c.progress = Some(progress)).await
    }
}
