use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::quiz::QuizQuestion;

pub const MIN_REMEDIATION_QUESTIONS: usize = 3;
pub const MAX_REMEDIATION_QUESTIONS: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RemediationError {
    #[error("remediation needs at least one missed question")]
    NothingMissed,

    #[error("remediation must contain 3-4 questions, got {0}")]
    QuestionCount(usize),

    #[error("remediation question {0} points at a missing option")]
    InvalidCorrectAnswer(usize),

    #[error("remediation explanation cannot be empty")]
    EmptyExplanation,
}

/// Follow-up quiz scoped to the questions a learner missed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remediation {
    explanation: String,
    questions: Vec<QuizQuestion>,
}

impl Remediation {
    /// # Errors
    ///
    /// Returns `RemediationError` if the explanation is blank, the question count is
    /// outside 3..=4, or a question has no valid correct option.
    pub fn new(
        explanation: impl Into<String>,
        questions: Vec<QuizQuestion>,
    ) -> Result<Self, RemediationError> {
        let explanation = explanation.into();
        if explanation.trim().is_empty() {
            return Err(RemediationError::EmptyExplanation);
        }
        if !(MIN_REMEDIATION_QUESTIONS..=MAX_REMEDIATION_QUESTIONS).contains(&questions.len()) {
            return Err(RemediationError::QuestionCount(questions.len()));
        }
        if let Some(idx) = questions.iter().position(|q| !q.has_valid_answer()) {
            return Err(RemediationError::InvalidCorrectAnswer(idx));
        }
        Ok(Self {
            explanation,
            questions,
        })
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }
}
