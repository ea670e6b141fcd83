use std::cmp::Reverse;
use std::sync::Arc;

use serde::Serialize;
use signal_core::insights::{UserSummary, summarize_users};
use signal_core::model::{ActivityEventType, ActivityLogEntry};
use storage::repository::{ActivityLogRepository, CourseRepository};
use tracing::debug;

use crate::error::InsightsError;

/// Activity entries fetched for one dashboard.
pub const RECENT_LOG_LIMIT: u32 = 80;
/// Courses fetched for one dashboard.
pub const RECENT_COURSE_LIMIT: u32 = 80;
/// Login events shown in the feed.
pub const LOGIN_FEED_LEN: usize = 6;
/// Topic requests shown in the feed.
pub const TOPIC_FEED_LEN: usize = 8;

/// One row of the "what people asked for" feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRequest {
    pub user: String,
    pub event_type: ActivityEventType,
    pub topic: String,
    pub timestamp: String,
}

impl TopicRequest {
    fn from_entry(entry: &ActivityLogEntry) -> Self {
        Self {
            user: entry.user().to_owned(),
            event_type: entry.event_type.clone(),
            topic: entry.display_topic().to_owned(),
            timestamp: entry.timestamp.clone(),
        }
    }
}

/// Everything the admin view renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    /// Most recent login first; users who never logged in come last.
    pub users: Vec<UserSummary>,
    pub recent_logins: Vec<ActivityLogEntry>,
    pub recent_topics: Vec<TopicRequest>,
}

/// Read-only admin analytics over recent logs and courses.
#[derive(Clone)]
pub struct InsightsService {
    courses: Arc<dyn CourseRepository>,
    logs: Arc<dyn ActivityLogRepository>,
}

impl InsightsService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>, logs: Arc<dyn ActivityLogRepository>) -> Self {
        Self { courses, logs }
    }

    /// Summarize the latest activity window.
    ///
    /// # Errors
    ///
    /// Returns `InsightsError::Storage` if either source cannot be read.
    pub async fn dashboard(&self) -> Result<AdminDashboard, InsightsError> {
        let logs = self.logs.recent_logs(RECENT_LOG_LIMIT).await?;
        let courses = self.courses.recent_courses(RECENT_COURSE_LIMIT).await?;
        debug!(logs = logs.len(), courses = courses.len(), "building dashboard");
        Ok(build_dashboard(&logs, &courses))
    }
}

/// Assemble the dashboard from already-fetched data (`logs` newest first).
#[must_use]
pub fn build_dashboard(
    logs: &[ActivityLogEntry],
    courses: &[signal_core::model::Course],
) -> AdminDashboard {
    let mut users = summarize_users(logs, courses);
    users.sort_by_key(|u| Reverse(u.last_login_ms()));

    let recent_logins = logs
        .iter()
        .filter(|e| e.event_type == ActivityEventType::Login)
        .take(LOGIN_FEED_LEN)
        .cloned()
        .collect();

    let recent_topics = logs
        .iter()
        .filter(|e| e.event_type.is_topic_request())
        .take(TOPIC_FEED_LEN)
        .map(TopicRequest::from_entry)
        .collect();

    AdminDashboard {
        users,
        recent_logins,
        recent_topics,
    }
}
