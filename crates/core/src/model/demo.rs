//! Built-in sample course, served for the demo topic and used by the seeder.

use chrono::{DateTime, Utc};

use crate::model::course::{Chapter, Course};
use crate::model::ids::{ChapterId, CourseId};
use crate::model::quiz::QuizQuestion;

/// Topic that yields the sample course instead of calling the model.
pub const DEMO_TOPIC: &str = "test";

/// Case-insensitive match against [`DEMO_TOPIC`], ignoring surrounding whitespace.
#[must_use]
pub fn is_demo_topic(topic: &str) -> bool {
    topic.trim().eq_ignore_ascii_case(DEMO_TOPIC)
}

fn q(question: &str, options: [&str; 4], correct_answer: usize) -> QuizQuestion {
    QuizQuestion::new(
        question,
        options.iter().map(|o| (*o).to_owned()).collect(),
        correct_answer,
    )
}

fn dikw_chapter() -> Chapter {
    let levels = ["Data", "Information", "Knowledge", "Wisdom"];
    Chapter {
        id: ChapterId::new(1),
        title: "From Data to Wisdom: the DIKW Ladder".into(),
        summary: "How raw observations become clinical judgement.".into(),
        content_markdown: "The **DIKW ladder** describes four levels: data, information, \
            knowledge and wisdom. Each level adds context to the one below it."
            .into(),
        audio_script: "A single heart rate on its own is just data. Put it next to the \
            patient's history and it starts to mean something."
            .into(),
        quiz: vec![
            q("Applying knowledge to decide what to do belongs to which level?", levels, 3),
            q(
                "A lone reading of 98.6 with no units or patient is:",
                ["Wisdom", "Data", "Information", "Knowledge"],
                1,
            ),
            q("Patterns recognised across many observations are:", levels, 2),
            q(
                "Which description fits wisdom best?",
                [
                    "Unprocessed numbers",
                    "Judging why and when to act",
                    "Sorted tables",
                    "Machine storage",
                ],
                1,
            ),
            q(
                "Health record systems mostly hold which levels?",
                ["Data and information", "Wisdom", "Knowledge", "None"],
                0,
            ),
        ],
        flashcards: Vec::new(),
    }
}

fn terminology_chapter() -> Chapter {
    let options = ["SNOMED CT", "LOINC", "ICD-10", "HL7 FHIR"];
    Chapter {
        id: ChapterId::new(2),
        title: "Shared Clinical Vocabularies".into(),
        summary: "Why systems need one name for one concept.".into(),
        content_markdown: "Standard terminologies such as SNOMED CT and LOINC let \
            different systems exchange records without losing meaning."
            .into(),
        audio_script: "If one chart says 'high BP' and another says 'hypertension', \
            software needs a shared code to know they agree."
            .into(),
        quiz: vec![
            q("Which vocabulary codes clinical findings?", options, 0),
            q("Which vocabulary codes laboratory observations?", options, 1),
            q("Which classification is used for billing diagnoses?", options, 2),
            q("Which is an exchange standard rather than a vocabulary?", options, 3),
            q("Shared vocabularies mainly improve:", ["Interoperability", "Speed", "Storage", "Cost"], 0),
        ],
        flashcards: Vec::new(),
    }
}

/// The sample "Nursing Informatics 101" course with two five-question chapters.
#[must_use]
pub fn demo_course(course_id: CourseId, created_at: DateTime<Utc>) -> Course {
    Course {
        course_id,
        title: "Nursing Informatics 101".into(),
        style: "Professional".into(),
        chapters: vec![dikw_chapter(), terminology_chapter()],
        progress: None,
        quiz_history: None,
        verification: None,
        username: None,
        created_at: Some(created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn demo_topic_matches_case_insensitively() {
        assert!(is_demo_topic("test"));
        assert!(is_demo_topic(" TeSt "));
        assert!(!is_demo_topic("testing"));
    }

    #[test]
    fn demo_course_has_well_formed_quizzes() {
        let course = demo_course(CourseId::new("demo-1"), fixed_now());
        assert_eq!(course.chapter_count(), 2);
        for chapter in &course.chapters {
            assert_eq!(chapter.quiz_len(), 5);
            assert!(chapter.quiz.iter().all(QuizQuestion::has_valid_answer));
        }
    }
}
