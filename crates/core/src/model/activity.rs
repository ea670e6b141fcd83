use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::model::course::ANONYMOUS_USER;
use crate::model::ids::CourseId;
use crate::time::to_stored_timestamp;

/// Kind of an activity log event.
///
/// Names outside the known set are kept verbatim in `Other` so they survive a
/// read-modify-write of the log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityEventType {
    Login,
    Signup,
    Logout,
    Search,
    GenerateCourse,
    QuizSubmit,
    Remediation,
    ProfileUpdate,
    Other(String),
}

impl ActivityEventType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Login => "login",
            Self::Signup => "signup",
            Self::Logout => "logout",
            Self::Search => "search",
            Self::GenerateCourse => "generate_course",
            Self::QuizSubmit => "quiz_submit",
            Self::Remediation => "remediation",
            Self::ProfileUpdate => "profile_update",
            Self::Other(name) => name,
        }
    }

    /// Events that carry a learner's topic request.
    #[must_use]
    pub fn is_topic_request(&self) -> bool {
        matches!(self, Self::GenerateCourse | Self::Search)
    }
}

impl fmt::Display for ActivityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ActivityEventType {
    fn from(s: &str) -> Self {
        match s {
            "login" => Self::Login,
            "signup" => Self::Signup,
            "logout" => Self::Logout,
            "search" => Self::Search,
            "generate_course" => Self::GenerateCourse,
            "quiz_submit" => Self::QuizSubmit,
            "remediation" => Self::Remediation,
            "profile_update" => Self::ProfileUpdate,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for ActivityEventType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ActivityEventType> for String {
    fn from(kind: ActivityEventType) -> Self {
        match kind {
            ActivityEventType::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl FromStr for ActivityEventType {
    type Err = std::convert::Infallible;

    /// Never fails; the log is free-form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

/// Payload supplied by callers of the activity sink; id and timestamp are stamped on write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<CourseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_meta: Option<Value>,
}

impl ActivityDraft {
    #[must_use]
    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_course(mut self, course_id: CourseId) -> Self {
        self.course_id = Some(course_id);
        self
    }

    #[must_use]
    pub fn with_request(mut self, request: Value) -> Self {
        self.request = Some(request);
        self
    }

    #[must_use]
    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

/// Append-only activity event.
///
/// `timestamp` keeps the stored string verbatim; it is parsed only when compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: String,
    pub event_type: ActivityEventType,
    pub timestamp: String,
    #[serde(flatten)]
    pub payload: ActivityDraft,
}

impl ActivityLogEntry {
    /// New entry with a random id, stamped at `at`.
    #[must_use]
    pub fn stamped(event_type: ActivityEventType, at: DateTime<Utc>, payload: ActivityDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            timestamp: to_stored_timestamp(at),
            payload,
        }
    }

    /// Acting user, or `"anonymous"`.
    #[must_use]
    pub fn user(&self) -> &str {
        self.payload
            .user
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(ANONYMOUS_USER)
    }

    fn request_str(&self, key: &str) -> Option<&str> {
        self.payload.request.as_ref()?.get(key)?.as_str()
    }

    /// Topic named by a course-generation request: `request.topic`, else `request.query`.
    #[must_use]
    pub fn requested_topic(&self) -> Option<&str> {
        self.request_str("topic")
            .or_else(|| self.request_str("query"))
            .filter(|t| !t.is_empty())
    }

    /// Search term: top-level `query`, else `request.query`.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.payload
            .query
            .as_deref()
            .or_else(|| self.request_str("query"))
            .filter(|t| !t.is_empty())
    }

    /// Topic shown in the admin feed: `request.topic`, `request.query`, then `query`.
    #[must_use]
    pub fn display_topic(&self) -> &str {
        self.request_str("topic")
            .or_else(|| self.request_str("query"))
            .or(self.payload.query.as_deref())
            .unwrap_or("–")
    }
}
