use std::sync::Arc;

use signal_core::model::{Course, CourseId, User, Verification, demo_course, is_demo_topic};
use tracing::{debug, info, warn};

use crate::Clock;
use crate::ai::{CourseGenerator, CourseVerifier};
use crate::course_service::CourseService;
use crate::error::GenerationError;

/// Topic in, verified and stored course out.
#[derive(Clone)]
pub struct GenerationService {
    clock: Clock,
    generator: Arc<dyn CourseGenerator>,
    verifier: Arc<dyn CourseVerifier>,
    courses: CourseService,
}

impl GenerationService {
    #[must_use]
    pub fn new(
        clock: Clock,
        generator: Arc<dyn CourseGenerator>,
        verifier: Arc<dyn CourseVerifier>,
        courses: CourseService,
    ) -> Self {
        Self {
            clock,
            generator,
            verifier,
            courses,
        }
    }

    /// Build a course on `topic` for `user` and store it under their name.
    ///
    /// The demo topic short-circuits to the built-in course. Otherwise the
    /// generated course is shape-checked, then reviewed; a review scoring below
    /// the refinement threshold triggers one rewrite and a second review.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::EmptyTopic` for a blank topic.
    /// Returns `GenerationError::Failed` if generation fails or the course has the wrong shape.
    /// Returns `GenerationError::Course` if the course cannot be stored.
    pub async fn generate_course(&self, topic: &str, user: &User) -> Result<Course, GenerationError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(GenerationError::EmptyTopic);
        }

        let now = self.clock.now();
        let mut course = if is_demo_topic(topic) {
            info!(user = user.username(), "serving demo course");
            demo_course(
                CourseId::new(format!("demo-{}", now.timestamp_millis())),
                now,
            )
        } else {
            self.generate_verified(topic, user).await?
        };
        if course.created_at.is_none() {
            course.created_at = Some(now);
        }

        let saved = self
            .courses
            .save_generated(course, user.username(), topic)
            .await?;
        info!(course_id = %saved.course_id, topic, "course generated");
        Ok(saved)
    }

    async fn generate_verified(&self, topic: &str, user: &User) -> Result<Course, GenerationError> {
        debug!(topic, "requesting course");
        let mut course = self
            .generator
            .generate(topic, user.learner_context())
            .await?;
        course.validate_generated()?;

        let verification = self.review(&course).await;
        if !verification.needs_refinement() {
            course.verification = Some(verification);
            return Ok(course);
        }

        debug!(course_id = %course.course_id, score = verification.score(), "refining course");
        let refined = match self.generator.refine(&course, verification.notes()).await {
            Ok(refined) => refined,
            Err(err) => {
                warn!(course_id = %course.course_id, error = %err, "refinement failed, keeping first draft");
                course.verification = Some(verification);
                return Ok(course);
            }
        };
        if let Err(err) = refined.validate_generated() {
            warn!(course_id = %course.course_id, error = %err, "refined course malformed, keeping first draft");
            course.verification = Some(verification);
            return Ok(course);
        }

        let mut course = refined;
        course.verification = Some(self.review(&course).await.after_refinement());
        Ok(course)
    }

    /// Review `course`, degrading to a manual-review flag if the verifier fails.
    async fn review(&self, course: &Course) -> Verification {
        match self.verifier.verify(course).await {
            Ok(verification) => verification,
            Err(err) => {
                warn!(course_id = %course.course_id, error = %err, "verification unavailable");
                Verification::manual_review_fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use signal_core::model::{
        ActivityEventType, Chapter, ChapterId, QuizQuestion, VerificationStatus,
    };
    use signal_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    use crate::activity_service::ActivityService;
    use crate::error::{AiError, GenerationCause};

    fn generated(id: &str, title: &str) -> Course {
        let mut course = demo_course(CourseId::new(id), fixed_now());
        course.title = title.into();
        course.created_at = None;
        course.chapters.push(Chapter {
            id: ChapterId::new(3),
            title: "Three".into(),
            summary: String::new(),
            content_markdown: String::new(),
            audio_script: String::new(),
            quiz: (0..5)
                .map(|i| QuizQuestion::new(format!("q{i}"), vec!["a".into(), "b".into(), "c".into(), "d".into()], 0))
                .collect(),
            flashcards: Vec::new(),
        });
        course
    }

    #[derive(Default)]
    struct FakeGenerator {
        fail: bool,
        two_chapters: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CourseGenerator for FakeGenerator {
        async fn generate(&self, topic: &str, context: Option<&str>) -> Result<Course, AiError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("generate:{topic}:{}", context.unwrap_or("-")));
            if self.fail {
                return Err(AiError::EmptyResponse);
            }
            let mut course = generated("gen-1", "First draft");
            if self.two_chapters {
                course.chapters.pop();
            }
            Ok(course)
        }

        async fn refine(&self, course: &Course, notes: &str) -> Result<Course, AiError> {
            self.calls.lock().unwrap().push(format!("refine:{notes}"));
            Ok(generated(course.course_id.as_str(), "Refined"))
        }
    }

    struct FakeVerifier {
        scores: Mutex<Vec<Option<u32>>>,
    }

    impl FakeVerifier {
        fn new(scores: Vec<Option<u32>>) -> Self {
            Self {
                scores: Mutex::new(scores),
            }
        }
    }

    #[async_trait]
    impl CourseVerifier for FakeVerifier {
        async fn verify(&self, _course: &Course) -> Result<Verification, AiError> {
            let next = self.scores.lock().unwrap().remove(0);
            match next {
                Some(score) => Ok(Verification::new(VerificationStatus::Verified, score, "notes")?),
                None => Err(AiError::EmptyResponse),
            }
        }
    }

    fn pipeline(
        generator: Arc<FakeGenerator>,
        verifier: FakeVerifier,
    ) -> (GenerationService, ActivityService) {
        let repo = InMemoryRepository::new();
        let activity = ActivityService::new(fixed_clock(), Arc::new(repo.clone()));
        let courses = CourseService::new(fixed_clock(), Arc::new(repo), activity.clone());
        let service =
            GenerationService::new(fixed_clock(), generator, Arc::new(verifier), courses);
        (service, activity)
    }

    fn ada() -> User {
        User::new("ada").unwrap().with_about_me("ICU nurse")
    }

    #[tokio::test]
    async fn blank_topic_is_rejected() {
        let (service, _) = pipeline(Arc::default(), FakeVerifier::new(vec![]));
        let err = service.generate_course("  ", &ada()).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyTopic));
    }

    #[tokio::test]
    async fn demo_topic_skips_the_model() {
        let generator = Arc::new(FakeGenerator::default());
        let (service, activity) = pipeline(generator.clone(), FakeVerifier::new(vec![]));
        let course = service.generate_course(" TEST ", &ada()).await.unwrap();

        assert_eq!(course.course_id.as_str(), "demo-1700000000000");
        assert_eq!(course.owner(), "ada");
        assert!(generator.calls.lock().unwrap().is_empty());
        let logs = activity.recent(5).await.unwrap();
        assert_eq!(logs[0].event_type, ActivityEventType::GenerateCourse);
        assert_eq!(logs[0].requested_topic(), Some("TEST"));
    }

    #[tokio::test]
    async fn high_score_is_kept_without_refinement() {
        let generator = Arc::new(FakeGenerator::default());
        let (service, _) = pipeline(generator.clone(), FakeVerifier::new(vec![Some(95)]));
        let course = service.generate_course("sepsis", &ada()).await.unwrap();

        assert_eq!(course.title, "First draft");
        assert_eq!(course.created_at, Some(fixed_now()));
        let verification = course.verification.unwrap();
        assert_eq!(verification.score(), 95);
        assert!(!verification.refined());
        assert_eq!(
            *generator.calls.lock().unwrap(),
            vec!["generate:sepsis:ICU nurse".to_string()]
        );
    }

    #[tokio::test]
    async fn low_score_refines_once_and_reverifies() {
        let generator = Arc::new(FakeGenerator::default());
        let (service, _) = pipeline(generator.clone(), FakeVerifier::new(vec![Some(70), Some(80)]));
        let course = service.generate_course("sepsis", &ada()).await.unwrap();

        assert_eq!(course.title, "Refined");
        let verification = course.verification.unwrap();
        assert_eq!(verification.score(), 80);
        assert!(verification.refined());
        assert_eq!(generator.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn verifier_outage_degrades_to_manual_review() {
        let generator = Arc::new(FakeGenerator::default());
        let (service, _) = pipeline(generator, FakeVerifier::new(vec![None, None]));
        let course = service.generate_course("sepsis", &ada()).await.unwrap();

        let verification = course.verification.unwrap();
        assert_eq!(verification.status(), VerificationStatus::Caution);
        assert_eq!(verification.score(), 0);
        assert!(verification.refined());
    }

    #[tokio::test]
    async fn collaborator_failures_share_one_error() {
        let generator = Arc::new(FakeGenerator {
            fail: true,
            ..FakeGenerator::default()
        });
        let (service, activity) = pipeline(generator, FakeVerifier::new(vec![]));
        let err = service.generate_course("sepsis", &ada()).await.unwrap_err();
        assert_eq!(err.to_string(), "course generation failed");
        assert!(matches!(err, GenerationError::Failed(GenerationCause::Ai(_))));
        assert!(activity.recent(5).await.unwrap().is_empty());

        let generator = Arc::new(FakeGenerator {
            two_chapters: true,
            ..FakeGenerator::default()
        });
        let (service, _) = pipeline(generator, FakeVerifier::new(vec![]));
        let err = service.generate_course("sepsis", &ada()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Failed(GenerationCause::Shape(_))));
    }
}
