use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::activity_service::ActivityService;
use crate::ai::{AiConfig, ChatClient, ChatModel, CourseGenerator, CourseVerifier, Remediator};
use crate::course_service::CourseService;
use crate::error::AppServicesError;
use crate::generation_service::GenerationService;
use crate::insights_service::InsightsService;
use crate::remediation_service::RemediationService;
use crate::user_service::UserService;

/// The AI side of the app, one trait object per role.
#[derive(Clone)]
pub struct Collaborators {
    pub generator: Arc<dyn CourseGenerator>,
    pub verifier: Arc<dyn CourseVerifier>,
    pub remediator: Arc<dyn Remediator>,
}

impl Collaborators {
    /// Every role served by the same chat model. Calls fail with
    /// `AiError::Disabled` when `config` is `None`.
    #[must_use]
    pub fn chat(config: Option<AiConfig>) -> Self {
        let model = Arc::new(ChatModel::new(ChatClient::new(config)));
        Self {
            generator: model.clone(),
            verifier: model.clone(),
            remediator: model,
        }
    }
}

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    ai_enabled: bool,
    activity: Arc<ActivityService>,
    users: Arc<UserService>,
    courses: Arc<CourseService>,
    generation: Arc<GenerationService>,
    remediation: Arc<RemediationService>,
    insights: Arc<InsightsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the chat model.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        ai: Option<AiConfig>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let ai_enabled = ai.is_some();
        let mut services = Self::from_parts(&storage, clock, Collaborators::chat(ai));
        services.ai_enabled = ai_enabled;
        Ok(services)
    }

    /// Wire services over an already-open `storage` with explicit collaborators.
    #[must_use]
    pub fn from_parts(storage: &Storage, clock: Clock, ai: Collaborators) -> Self {
        let activity = ActivityService::new(clock, Arc::clone(&storage.activity));
        let users = UserService::new(Arc::clone(&storage.users), activity.clone());
        let courses = CourseService::new(clock, Arc::clone(&storage.courses), activity.clone());
        let generation = GenerationService::new(clock, ai.generator, ai.verifier, courses.clone());
        let remediation = RemediationService::new(ai.remediator);
        let insights =
            InsightsService::new(Arc::clone(&storage.courses), Arc::clone(&storage.activity));

        Self {
            ai_enabled: true,
            activity: Arc::new(activity),
            users: Arc::new(users),
            courses: Arc::new(courses),
            generation: Arc::new(generation),
            remediation: Arc::new(remediation),
            insights: Arc::new(insights),
        }
    }

    /// False when no model is configured; only the demo topic can be generated.
    #[must_use]
    pub fn ai_enabled(&self) -> bool {
        self.ai_enabled
    }

    #[must_use]
    pub fn activity(&self) -> Arc<ActivityService> {
        Arc::clone(&self.activity)
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn courses(&self) -> Arc<CourseService> {
        Arc::clone(&self.courses)
    }

    #[must_use]
    pub fn generation(&self) -> Arc<GenerationService> {
        Arc::clone(&self.generation)
    }

    #[must_use]
    pub fn remediation(&self) -> Arc<RemediationService> {
        Arc::clone(&self.remediation)
    }

    #[must_use]
    pub fn insights(&self) -> Arc<InsightsService> {
        Arc::clone(&self.insights)
    }
}
