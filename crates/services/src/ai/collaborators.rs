use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use signal_core::model::{
    Chapter, Course, CourseId, QuizQuestion, Remediation, Verification, VerificationStatus,
};

use super::client::ChatClient;
use crate::error::AiError;

/// Produces and revises course documents.
#[async_trait]
pub trait CourseGenerator: Send + Sync {
    /// Generate a course on `topic`, tailored to `learner_context` when given.
    ///
    /// # Errors
    ///
    /// Returns `AiError` if the model cannot be reached or replies with invalid JSON.
    async fn generate(&self, topic: &str, learner_context: Option<&str>)
    -> Result<Course, AiError>;

    /// Rewrite `course` to address reviewer `notes`.
    ///
    /// # Errors
    ///
    /// Returns `AiError` if the model cannot be reached or replies with invalid JSON.
    async fn refine(&self, course: &Course, notes: &str) -> Result<Course, AiError>;
}

/// Safety and accuracy review of generated content.
#[async_trait]
pub trait CourseVerifier: Send + Sync {
    /// # Errors
    ///
    /// Returns `AiError` if the review cannot be obtained or is out of range.
    async fn verify(&self, course: &Course) -> Result<Verification, AiError>;
}

/// Builds follow-up questions for concepts a learner missed.
#[async_trait]
pub trait Remediator: Send + Sync {
    /// # Errors
    ///
    /// Returns `AiError` if the model fails or the reply is not a valid remediation.
    async fn remediate(
        &self,
        chapter: &Chapter,
        missed: &[QuizQuestion],
    ) -> Result<Remediation, AiError>;
}

const COURSE_SYSTEM_PROMPT: &str = r#"You design short adaptive courses.
Reply with one JSON object of this shape and nothing else:
{
  "course_id": "string",
  "title": "string",
  "style": "string, e.g. Podcast or University Lecture",
  "chapters": [
    {
      "id": 1,
      "title": "string",
      "summary": "one or two sentences",
      "content_markdown": "about 300 words of markdown",
      "audio_script": "conversational narration, distinct from the content",
      "quiz": [{ "question": "string", "options": ["A", "B", "C", "D"], "correct_answer": 0 }],
      "flashcards": [{ "front": "string", "back": "string" }]
    }
  ]
}
Rules: exactly 3 chapters numbered 1 to 3; exactly 5 quiz questions per chapter;
exactly 4 options per question; correct_answer is the zero-based index of the right option."#;

const VERIFY_SYSTEM_PROMPT: &str = r#"You review learning material for safety and factual accuracy.
Reply with one JSON object: {"status": "VERIFIED" | "CAUTION" | "FLAGGED", "score": 0-100, "notes": "string"}.
Use VERIFIED only when nothing is misleading or unsafe."#;

const REMEDIATE_SYSTEM_PROMPT: &str = r#"You help a learner who missed some quiz questions.
Reply with one JSON object: {"explanation": "string", "questions": [{ "question": "string", "options": ["A", "B", "C", "D"], "correct_answer": 0 }]}.
Write 3 or 4 new questions that cover only the concepts behind the missed questions."#;

#[derive(Debug, Deserialize)]
struct VerificationReply {
    status: VerificationStatus,
    score: u32,
    #[serde(default)]
    notes: String,
}

#[derive(Debug, Deserialize)]
struct RemediationReply {
    explanation: String,
    questions: Vec<QuizQuestion>,
}

/// All AI collaborators backed by one chat model.
#[derive(Clone)]
pub struct ChatModel {
    client: ChatClient,
}

impl ChatModel {
    #[must_use]
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.client.enabled()
    }
}

fn ensure_course_id(mut course: Course) -> Course {
    if course.course_id.as_str().trim().is_empty() {
        course.course_id = CourseId::generate();
    }
    course
}

#[async_trait]
impl CourseGenerator for ChatModel {
    async fn generate(
        &self,
        topic: &str,
        learner_context: Option<&str>,
    ) -> Result<Course, AiError> {
        let mut prompt = format!("Create a course on: \"{topic}\"");
        if let Some(context) = learner_context {
            prompt.push_str("\nAbout the learner: ");
            prompt.push_str(context);
        }
        let course: Course = self
            .client
            .complete_json(COURSE_SYSTEM_PROMPT, &prompt)
            .await?;
        Ok(ensure_course_id(course))
    }

    async fn refine(&self, course: &Course, notes: &str) -> Result<Course, AiError> {
        let prompt = json!({
            "instruction": "Revise this course to resolve the reviewer notes. Keep the same shape and course_id.",
            "notes": notes,
            "course": course,
        })
        .to_string();
        let mut refined: Course = self
            .client
            .complete_json(COURSE_SYSTEM_PROMPT, &prompt)
            .await?;
        refined.course_id = course.course_id.clone();
        Ok(refined)
    }
}

#[async_trait]
impl CourseVerifier for ChatModel {
    async fn verify(&self, course: &Course) -> Result<Verification, AiError> {
        let prompt = json!({ "title": course.title, "chapters": course.chapters }).to_string();
        let reply: VerificationReply = self
            .client
            .complete_json(VERIFY_SYSTEM_PROMPT, &prompt)
            .await?;
        Ok(Verification::new(reply.status, reply.score, reply.notes)?)
    }
}

#[async_trait]
impl Remediator for ChatModel {
    async fn remediate(
        &self,
        chapter: &Chapter,
        missed: &[QuizQuestion],
    ) -> Result<Remediation, AiError> {
        let prompt = json!({
            "chapter": { "title": chapter.title, "summary": chapter.summary },
            "missed": missed,
        })
        .to_string();
        let reply: RemediationReply = self
            .client
            .complete_json(REMEDIATE_SYSTEM_PROMPT, &prompt)
            .await?;
        Ok(Remediation::new(reply.explanation, reply.questions)?)
    }
}
