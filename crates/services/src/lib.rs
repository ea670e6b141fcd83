#![forbid(unsafe_code)]

pub mod activity_service;
pub mod ai;
pub mod app_services;
pub mod course_service;
pub mod error;
pub mod generation_service;
pub mod insights_service;
pub mod remediation_service;
pub mod user_service;

pub use signal_core::Clock;

pub use activity_service::ActivityService;
pub use app_services::{AppServices, Collaborators};
pub use course_service::{CourseService, QuizOutcome};
pub use error::{
    AiError, AppServicesError, CourseServiceError, GenerationError, InsightsError,
    RemediationError, UserServiceError,
};
pub use generation_service::GenerationService;
pub use insights_service::{AdminDashboard, InsightsService, TopicRequest};
pub use remediation_service::RemediationService;
pub use user_service::UserService;
