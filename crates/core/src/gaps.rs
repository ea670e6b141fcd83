//! Knowledge gap ranking across a learner's courses.

use serde::Serialize;

use crate::grading::rounded_percent;
use crate::model::{ChapterId, Course};

/// Chapters scoring at or above this percentage count as mastered.
pub const MASTERY_THRESHOLD_PERCENT: u32 = 75;

/// Number of gaps reported per learner.
pub const MAX_REPORTED_GAPS: usize = 3;

/// A chapter whose latest quiz score is below the mastery threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGap {
    pub course_title: String,
    pub chapter_id: ChapterId,
    pub chapter_title: String,
    pub score_percent: u32,
}

/// Up to three weakest chapters, worst first.
///
/// Only chapters with a recorded score are considered. Equal scores keep input
/// order (course, then chapter).
#[must_use]
pub fn rank_knowledge_gaps<'a, I>(courses: I) -> Vec<KnowledgeGap>
where
    I: IntoIterator<Item = &'a Course>,
{
    let mut gaps: Vec<KnowledgeGap> = courses
        .into_iter()
        .flat_map(|course| {
            course.chapters.iter().filter_map(move |chapter| {
                let raw = course.progress.as_ref()?.score_for(chapter.id)?;
                let quiz_len = u64::from(chapter.quiz_len().max(1));
                let score_percent = rounded_percent(u64::from(raw), quiz_len).unwrap_or(0);
                (score_percent < MASTERY_THRESHOLD_PERCENT).then(|| KnowledgeGap {
                    course_title: course.title.clone(),
                    chapter_id: chapter.id,
                    chapter_title: chapter.title.clone(),
                    score_percent,
                })
            })
        })
        .collect();

    gaps.sort_by_key(|gap| gap.score_percent);
    gaps.truncate(MAX_REPORTED_GAPS);
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::course;
    use crate::model::CourseProgress;

    fn with_scores(id: &str, scores: &[u32]) -> Course {
        let mut c = course(id, &vec![10; scores.len()]);
        let mut progress = CourseProgress::fresh(c.chapter_count());
        for (chapter, score) in c.chapters.iter().zip(scores) {
            progress.completed_chapter_ids.push(chapter.id);
            progress.quiz_scores.insert(chapter.id, *score);
        }
        c.progress = Some(progress);
        c
    }

    #[test]
    fn keeps_only_sub_threshold_scores_in_ascending_order() {
        let a = with_scores("a", &[4, 9, 6]);
        let b = with_scores("b", &[7]);

        let gaps = rank_knowledge_gaps([&a, &b]);
        let percents: Vec<u32> = gaps.iter().map(|g| g.score_percent).collect();
        // 70 stays: anything under the 75% mastery bar is a gap.
        assert_eq!(percents, vec![40, 60, 70]);
        assert_eq!(gaps[0].course_title, "Course a");
        assert_eq!(gaps[0].chapter_id, ChapterId::new(1));
    }

    #[test]
    fn score_exactly_at_threshold_is_mastered() {
        // 3 of 4 is 75%, which is not a gap.
        let a = with_scores("a", &[4, 9, 6]);
        let mut b = course("b", &[4]);
        let mut progress = CourseProgress::fresh(1);
        progress.quiz_scores.insert(ChapterId::new(1), 3);
        b.progress = Some(progress);

        let gaps = rank_knowledge_gaps([&a, &b]);
        let percents: Vec<u32> = gaps.iter().map(|g| g.score_percent).collect();
        assert_eq!(percents, vec![40, 60]);
    }

    #[test]
    fn truncates_to_three() {
        let a = with_scores("a", &[1, 2, 3, 4, 5]);
        let gaps = rank_knowledge_gaps([&a]);
        assert_eq!(gaps.len(), MAX_REPORTED_GAPS);
        assert_eq!(gaps[2].score_percent, 30);
    }

    #[test]
    fn ties_keep_course_then_chapter_order() {
        let a = with_scores("a", &[5, 5]);
        let b = with_scores("b", &[5]);
        let gaps = rank_knowledge_gaps([&b, &a]);
        assert_eq!(gaps[0].course_title, "Course b");
        assert_eq!(gaps[1].course_title, "Course a");
        assert_eq!(gaps[1].chapter_id, ChapterId::new(1));
        assert_eq!(gaps[2].chapter_id, ChapterId::new(2));
    }

    #[test]
    fn empty_quiz_is_scored_against_one() {
        let mut c = course("c", &[0]);
        let mut progress = CourseProgress::fresh(1);
        progress.quiz_scores.insert(ChapterId::new(1), 0);
        c.progress = Some(progress);
        let gaps = rank_knowledge_gaps([&c]);
        assert_eq!(gaps[0].score_percent, 0);
    }

    #[test]
    fn no_progress_means_no_gaps() {
        let c = course("c", &[5, 5]);
        assert!(rank_knowledge_gaps([&c]).is_empty());
    }

    #[test]
    fn output_is_sorted_bounded_and_below_threshold() {
        let courses: Vec<Course> = (0..6_u32)
            .map(|i| with_scores(&format!("c{i}"), &[(i * 3) % 11, (i * 7) % 11, i % 11]))
            .collect();
        let gaps = rank_knowledge_gaps(&courses);
        assert!(gaps.len() <= MAX_REPORTED_GAPS);
        assert!(gaps.windows(2).all(|w| w[0].score_percent <= w[1].score_percent));
        assert!(gaps.iter().all(|g| g.score_percent < MASTERY_THRESHOLD_PERCENT));
    }
}
