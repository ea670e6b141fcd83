use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::ChapterId;

/// A learner's standing in one course.
///
/// Persisted inside the course document, so field names follow the stored
/// camelCase layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub total_chapters: u32,
    /// Completed chapters in completion order, without duplicates.
    pub completed_chapter_ids: Vec<ChapterId>,
    /// Raw score (correct answers) of the latest attempt per chapter.
    pub quiz_scores: BTreeMap<ChapterId, u32>,
    /// 0–100.
    pub overall_grade: u32,
    /// 0–100.
    pub percent_complete: u32,
}

impl CourseProgress {
    /// Progress for a course nobody has touched yet.
    #[must_use]
    pub fn fresh(total_chapters: u32) -> Self {
        Self {
            total_chapters,
            completed_chapter_ids: Vec::new(),
            quiz_scores: BTreeMap::new(),
            overall_grade: 0,
            percent_complete: 0,
        }
    }

    #[must_use]
    pub fn is_completed(&self, chapter_id: ChapterId) -> bool {
        self.completed_chapter_ids.contains(&chapter_id)
    }

    #[must_use]
    pub fn score_for(&self, chapter_id: ChapterId) -> Option<u32> {
        self.quiz_scores.get(&chapter_id).copied()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed_chapter_ids.len()
    }

    #[must_use]
    pub fn is_course_complete(&self) -> bool {
        self.total_chapters > 0 && self.percent_complete >= 100
    }
}
