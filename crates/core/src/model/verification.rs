use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scores below this trigger one refine-and-reverify cycle.
pub const REFINEMENT_THRESHOLD: u8 = 90;

/// Note attached when the verifier could not be reached.
pub const MANUAL_REVIEW_NOTE: &str = "Automated verification unavailable; manual review needed.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("verification score must be within 0..=100, got {0}")]
    ScoreOutOfRange(u32),
}

/// Safety/accuracy classification attached to generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationStatus {
    Verified,
    Caution,
    Flagged,
}

impl VerificationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED",
            Self::Caution => "CAUTION",
            Self::Flagged => "FLAGGED",
        }
    }
}

/// Trust signal for a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    status: VerificationStatus,
    score: u8,
    notes: String,
    #[serde(default)]
    refined: bool,
}

impl Verification {
    /// # Errors
    ///
    /// Returns `VerificationError::ScoreOutOfRange` when `score > 100`.
    pub fn new(
        status: VerificationStatus,
        score: u32,
        notes: impl Into<String>,
    ) -> Result<Self, VerificationError> {
        let score = u8::try_from(score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or(VerificationError::ScoreOutOfRange(score))?;
        Ok(Self {
            status,
            score,
            notes: notes.into(),
            refined: false,
        })
    }

    /// Degraded result used when the verifier fails: delivery proceeds, flagged for a human.
    #[must_use]
    pub fn manual_review_fallback() -> Self {
        Self {
            status: VerificationStatus::Caution,
            score: 0,
            notes: MANUAL_REVIEW_NOTE.to_string(),
            refined: false,
        }
    }

    /// Mark this result as produced after a refinement pass.
    #[must_use]
    pub fn after_refinement(mut self) -> Self {
        self.refined = true;
        self
    }

    #[must_use]
    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    #[must_use]
    pub fn refined(&self) -> bool {
        self.refined
    }

    #[must_use]
    pub fn needs_refinement(&self) -> bool {
        self.score < REFINEMENT_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_scores_above_hundred() {
        let err = Verification::new(VerificationStatus::Verified, 101, "").unwrap_err();
        assert_eq!(err, VerificationError::ScoreOutOfRange(101));
    }

    #[test]
    fn fallback_is_caution_with_zero_score() {
        let v = Verification::manual_review_fallback();
        assert_eq!(v.status(), VerificationStatus::Caution);
        assert_eq!(v.score(), 0);
        assert!(v.notes().contains("manual review"));
        assert!(v.needs_refinement());
    }

    #[test]
    fn refinement_threshold_is_ninety() {
        let ok = Verification::new(VerificationStatus::Verified, 90, "fine").unwrap();
        let low = Verification::new(VerificationStatus::Caution, 89, "shaky").unwrap();
        assert!(!ok.needs_refinement());
        assert!(low.needs_refinement());
    }

    #[test]
    fn status_uses_uppercase_wire_names() {
        let json = serde_json::to_string(&VerificationStatus::Flagged).unwrap();
        assert_eq!(json, "\"FLAGGED\"");
    }
}
