use serde::{Deserialize, Serialize};

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// A multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

impl QuizQuestion {
    #[must_use]
    pub fn new(question: impl Into<String>, options: Vec<String>, correct_answer: usize) -> Self {
        Self {
            question: question.into(),
            options,
            correct_answer,
        }
    }

    /// True when `option` is the correct option index.
    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_answer
    }

    /// True when the correct index points at an existing option.
    #[must_use]
    pub fn has_valid_answer(&self) -> bool {
        self.correct_answer < self.options.len()
    }
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// One recorded answer: the question, what was picked, and whether it was right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub question: QuizQuestion,
    pub selected_option: Option<usize>,
    pub is_correct: bool,
}

/// A graded pass over a chapter quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    answers: Vec<QuizAnswer>,
    score: u32,
}

impl QuizAttempt {
    /// Grade `selections` against `questions` position by position.
    ///
    /// Missing selections count as unanswered (and wrong). Extra selections are ignored.
    #[must_use]
    pub fn grade(questions: &[QuizQuestion], selections: &[Option<usize>]) -> Self {
        let answers: Vec<QuizAnswer> = questions
            .iter()
            .enumerate()
            .map(|(idx, question)| {
                let selected_option = selections.get(idx).copied().flatten();
                QuizAnswer {
                    question: question.clone(),
                    selected_option,
                    is_correct: selected_option.is_some_and(|opt| question.is_correct(opt)),
                }
            })
            .collect();

        let score = answers.iter().filter(|a| a.is_correct).count();
        Self {
            answers,
            score: u32::try_from(score).unwrap_or(u32::MAX),
        }
    }

    #[must_use]
    pub fn answers(&self) -> &[QuizAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn into_answers(self) -> Vec<QuizAnswer> {
        self.answers
    }

    /// Count of correct answers.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        u32::try_from(self.answers.len()).unwrap_or(u32::MAX)
    }

    /// Zero wrong answers. Mastery advances the learner instead of remediating.
    #[must_use]
    pub fn is_mastery(&self) -> bool {
        self.answers.iter().all(|a| a.is_correct)
    }

    /// At least half the questions right, rounding the bar up.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.score >= self.question_count().div_ceil(2)
    }

    /// Questions answered wrongly or left blank, in quiz order.
    #[must_use]
    pub fn missed_questions(&self) -> Vec<QuizQuestion> {
        self.answers
            .iter()
            .filter(|a| !a.is_correct)
            .map(|a| a.question.clone())
            .collect()
    }
}
