use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ChapterId, CourseId};
use crate::model::progress::CourseProgress;
use crate::model::quiz::{QuizAnswer, QuizQuestion};
use crate::model::verification::Verification;

/// Chapters a generated course must contain.
pub const GENERATED_CHAPTER_COUNT: usize = 3;
/// Questions every generated chapter quiz must contain.
pub const QUESTIONS_PER_CHAPTER: usize = 5;
/// Options every generated question must offer.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Owner name used when a course or event has no user attached.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Answers per chapter for the most recent attempt.
pub type QuizHistory = BTreeMap<ChapterId, Vec<QuizAnswer>>;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course id cannot be empty")]
    EmptyId,

    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("expected {expected} chapters, got {actual}")]
    ChapterCount { expected: usize, actual: usize },

    #[error("duplicate chapter id {0}")]
    DuplicateChapter(ChapterId),

    #[error("chapter {chapter} has {actual} quiz questions, expected {expected}")]
    QuizLength {
        chapter: ChapterId,
        expected: usize,
        actual: usize,
    },

    #[error("chapter {chapter} question {index} has {actual} options, expected {expected}")]
    OptionCount {
        chapter: ChapterId,
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("chapter {chapter} question {index} points at a missing option")]
    InvalidCorrectAnswer { chapter: ChapterId, index: usize },
}

//
// ─── CHAPTER ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

/// One topic unit: reading content, narration and a quiz. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub title: String,
    pub summary: String,
    pub content_markdown: String,
    pub audio_script: String,
    #[serde(default)]
    pub quiz: Vec<QuizQuestion>,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
}

impl Chapter {
    #[must_use]
    pub fn quiz_len(&self) -> u32 {
        u32::try_from(self.quiz.len()).unwrap_or(u32::MAX)
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A generated course document, including the learner's progress on it.
///
/// The serialized layout is the stored document layout; the store replaces it whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: CourseId,
    pub title: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<CourseProgress>,
    #[serde(
        rename = "quizHistory",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub quiz_history: Option<QuizHistory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Course {
    #[must_use]
    pub fn chapter(&self, id: ChapterId) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// The chapter following `id` in reading order, if any.
    #[must_use]
    pub fn next_chapter(&self, id: ChapterId) -> Option<&Chapter> {
        let idx = self.chapters.iter().position(|c| c.id == id)?;
        self.chapters.get(idx + 1)
    }

    #[must_use]
    pub fn chapter_count(&self) -> u32 {
        u32::try_from(self.chapters.len()).unwrap_or(u32::MAX)
    }

    /// Quiz length per chapter id.
    #[must_use]
    pub fn quiz_lengths(&self) -> BTreeMap<ChapterId, u32> {
        self.chapters.iter().map(|c| (c.id, c.quiz_len())).collect()
    }

    /// Owner username, or `"anonymous"` when unset or blank.
    #[must_use]
    pub fn owner(&self) -> &str {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(ANONYMOUS_USER)
    }

    #[must_use]
    pub fn has_quiz_history(&self) -> bool {
        self.quiz_history.as_ref().is_some_and(|h| !h.is_empty())
    }

    /// Replace the recorded answers for a chapter (retakes overwrite).
    pub fn record_answers(&mut self, chapter_id: ChapterId, answers: Vec<QuizAnswer>) {
        self.quiz_history
            .get_or_insert_with(BTreeMap::new)
            .insert(chapter_id, answers);
    }

    /// Check the shape the generation collaborator promises.
    ///
    /// # Errors
    ///
    /// Returns the first `CourseError` found.
    pub fn validate_generated(&self) -> Result<(), CourseError> {
        if self.course_id.is_empty() {
            return Err(CourseError::EmptyId);
        }
        if self.title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        if self.chapters.len() != GENERATED_CHAPTER_COUNT {
            return Err(CourseError::ChapterCount {
                expected: GENERATED_CHAPTER_COUNT,
                actual: self.chapters.len(),
            });
        }

        let mut seen = Vec::with_capacity(self.chapters.len());
        for chapter in &self.chapters {
            if seen.contains(&chapter.id) {
                return Err(CourseError::DuplicateChapter(chapter.id));
            }
            seen.push(chapter.id);

            if chapter.quiz.len() != QUESTIONS_PER_CHAPTER {
                return Err(CourseError::QuizLength {
                    chapter: chapter.id,
                    expected: QUESTIONS_PER_CHAPTER,
                    actual: chapter.quiz.len(),
                });
            }
            for (index, question) in chapter.quiz.iter().enumerate() {
                if question.options.len() != OPTIONS_PER_QUESTION {
                    return Err(CourseError::OptionCount {
                        chapter: chapter.id,
                        index,
                        expected: OPTIONS_PER_QUESTION,
                        actual: question.options.len(),
                    });
                }
                if !question.has_valid_answer() {
                    return Err(CourseError::InvalidCorrectAnswer {
                        chapter: chapter.id,
                        index,
                    });
                }
            }
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//


#[cfg(test)]
mod tests {
    use super::fixtures::course;
    use super::*;

    #[test]
    fn generated_shape_is_accepted() {
        course("c1", &[5, 5, 5]).validate_generated().unwrap();
    }

    #[test]
    fn wrong_chapter_count_is_rejected() {
        let err = course("c1", &[5, 5]).validate_generated().unwrap_err();
        assert_eq!(
            err,
            CourseError::ChapterCount {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn short_quiz_is_rejected() {
        let err = course("c1", &[5, 4, 5]).validate_generated().unwrap_err();
        assert!(matches!(err, CourseError::QuizLength { actual: 4, .. }));
    }

    #[test]
    fn out_of_range_answer_is_rejected() {
        let mut c = course("c1", &[5, 5, 5]);
        c.chapters[1].quiz[2].correct_answer = 4;
        let err = c.validate_generated().unwrap_err();
        assert_eq!(
            err,
            CourseError::InvalidCorrectAnswer {
                chapter: ChapterId::new(2),
                index: 2
            }
        );
    }

    #[test]
    fn owner_defaults_to_anonymous() {
        let mut c = course("c1", &[5]);
        assert_eq!(c.owner(), ANONYMOUS_USER);
        c.username = Some("  ".into());
        assert_eq!(c.owner(), ANONYMOUS_USER);
        c.username = Some("ada".into());
        assert_eq!(c.owner(), "ada");
    }

    #[test]
    fn next_chapter_follows_reading_order() {
        let c = course("c1", &[5, 5, 5]);
        assert_eq!(
            c.next_chapter(ChapterId::new(1)).map(|ch| ch.id),
            Some(ChapterId::new(2))
        );
        assert!(c.next_chapter(ChapterId::new(3)).is_none());
        assert!(c.next_chapter(ChapterId::new(9)).is_none());
    }

    #[test]
    fn retake_overwrites_history() {
        let mut c = course("c1", &[2]);
        let id = ChapterId::new(1);
        let first = crate::model::QuizAttempt::grade(&c.chapters[0].quiz, &[None, None])
            .into_answers();
        c.record_answers(id, first);
        assert!(c.has_quiz_history());
        let answers = crate::model::QuizAttempt::grade(&c.chapters[0].quiz, &[Some(0), Some(1)])
            .into_answers();
        c.record_answers(id, answers.clone());
        assert_eq!(c.quiz_history.as_ref().unwrap()[&id], answers);
        assert_eq!(c.quiz_history.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn document_round_trips_stored_field_names() {
        let mut c = course("c1", &[1]);
        c.username = Some("u1".into());
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["course_id"], "c1");
        assert_eq!(json["username"], "u1");
        assert!(json.get("quizHistory").is_none());
        let back: Course = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
    }
}
