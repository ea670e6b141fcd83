//! Progress aggregation: folds one quiz submission into a course's progress.
//!
//! Everything here is pure. The caller persists the course afterwards.

use std::collections::BTreeMap;

use crate::model::{Chapter, ChapterId, Course, CourseProgress, QuizAttempt};

/// A scored quiz for one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSubmission {
    pub chapter_id: ChapterId,
    /// Correct answers on the latest attempt.
    pub score: u32,
}

impl QuizSubmission {
    #[must_use]
    pub fn new(chapter_id: ChapterId, score: u32) -> Self {
        Self { chapter_id, score }
    }

    #[must_use]
    pub fn from_attempt(chapter_id: ChapterId, attempt: &QuizAttempt) -> Self {
        Self::new(chapter_id, attempt.score())
    }

    /// Full marks for a chapter mastered through remediation.
    #[must_use]
    pub fn mastered(chapter: &Chapter) -> Self {
        Self::new(chapter.id, chapter.quiz_len())
    }
}

/// `round(100 * part / whole)` with halves rounded up, capped at 100.
///
/// Returns `None` when `whole` is zero.
#[must_use]
pub fn rounded_percent(part: u64, whole: u64) -> Option<u32> {
    if whole == 0 {
        return None;
    }
    let rounded = (part.saturating_mul(200).saturating_add(whole)) / (whole * 2);
    Some(u32::try_from(rounded.min(100)).unwrap_or(100))
}

/// Fold `submission` into `previous` (or fresh progress for `chapter_count` chapters).
///
/// The completed set only grows, the chapter score is replaced, and both
/// percentages are recomputed from scratch. Chapters missing from
/// `quiz_lengths` add nothing to the grade denominator; when the denominator is
/// zero the grade is 100.
#[must_use]
pub fn aggregate(
    previous: Option<&CourseProgress>,
    chapter_count: u32,
    quiz_lengths: &BTreeMap<ChapterId, u32>,
    submission: QuizSubmission,
) -> CourseProgress {
    let mut next = previous
        .cloned()
        .unwrap_or_else(|| CourseProgress::fresh(chapter_count));

    if !next.is_completed(submission.chapter_id) {
        next.completed_chapter_ids.push(submission.chapter_id);
    }
    next.quiz_scores
        .insert(submission.chapter_id, submission.score);

    next.percent_complete = rounded_percent(
        next.completed_chapter_ids.len() as u64,
        u64::from(next.total_chapters),
    )
    .unwrap_or(0);

    let (earned, possible) =
        next.completed_chapter_ids
            .iter()
            .fold((0_u64, 0_u64), |(earned, possible), id| {
                (
                    earned + u64::from(next.quiz_scores.get(id).copied().unwrap_or(0)),
                    possible + u64::from(quiz_lengths.get(id).copied().unwrap_or(0)),
                )
            });
    next.overall_grade = rounded_percent(earned, possible).unwrap_or(100);

    next
}

/// Progress `course` would have after `submission`.
#[must_use]
pub fn apply_submission(course: &Course, submission: QuizSubmission) -> CourseProgress {
    aggregate(
        course.progress.as_ref(),
        course.chapter_count(),
        &course.quiz_lengths(),
        submission,
    )
}
