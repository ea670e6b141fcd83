use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use signal_core::model::{ActivityLogEntry, Course, CourseId, User};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    /// The backing store could not be reached or rejected the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by exact username.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_user(&self, username: &str) -> Result<User, StorageError>;

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the username is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StorageError>;

    /// Replace a user's profile, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the user cannot be stored.
    async fn upsert_user(&self, user: &User) -> Result<(), StorageError>;
}

/// Course documents keyed by `course_id`. Writes replace the whole document.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Insert or replace a course; `saved_at` orders `recent_courses`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course, saved_at: DateTime<Utc>)
    -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_course(&self, id: &CourseId) -> Result<Course, StorageError>;

    /// Courses owned by `owner`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn courses_for_user(&self, owner: &str) -> Result<Vec<Course>, StorageError>;

    /// Most recently saved courses, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn recent_courses(&self, limit: u32) -> Result<Vec<Course>, StorageError>;
}

/// Append-only activity log.
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` on a duplicate id, or other storage errors.
    async fn append_log(&self, entry: &ActivityLogEntry) -> Result<(), StorageError>;

    /// Newest entries first; equal timestamps return the later append first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn recent_logs(&self, limit: u32) -> Result<Vec<ActivityLogEntry>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Clone)]
struct StoredCourse {
    course: Course,
    saved_at: DateTime<Utc>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<Mutex<HashMap<String, User>>>,
    courses: Arc<Mutex<HashMap<CourseId, StoredCourse>>>,
    logs: Arc<Mutex<Vec<ActivityLogEntry>>>,
}

fn poisoned<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

fn take(limit: u32) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_user(&self, username: &str) -> Result<User, StorageError> {
        let guard = self.users.lock().map_err(poisoned)?;
        guard.get(username).cloned().ok_or(StorageError::NotFound)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut guard = self.users.lock().map_err(poisoned)?;
        if guard.contains_key(user.username()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(user.username().to_owned(), user.clone());
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut guard = self.users.lock().map_err(poisoned)?;
        guard.insert(user.username().to_owned(), user.clone());
        Ok(())
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn upsert_course(
        &self,
        course: &Course,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.courses.lock().map_err(poisoned)?;
        guard.insert(
            course.course_id.clone(),
            StoredCourse {
                course: course.clone(),
                saved_at,
            },
        );
        Ok(())
    }

    async fn get_course(&self, id: &CourseId) -> Result<Course, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        guard
            .get(id)
            .map(|stored| stored.course.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn courses_for_user(&self, owner: &str) -> Result<Vec<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        let mut owned: Vec<Course> = guard
            .values()
            .filter(|stored| stored.course.owner() == owner)
            .map(|stored| stored.course.clone())
            .collect();
        owned.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.course_id.cmp(&b.course_id))
        });
        Ok(owned)
    }

    async fn recent_courses(&self, limit: u32) -> Result<Vec<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        let mut stored: Vec<&StoredCourse> = guard.values().collect();
        stored.sort_by(|a, b| {
            b.saved_at
                .cmp(&a.saved_at)
                .then_with(|| a.course.course_id.cmp(&b.course.course_id))
        });
        Ok(stored
            .into_iter()
            .take(take(limit))
            .map(|s| s.course.clone())
            .collect())
    }
}

#[async_trait]
impl ActivityLogRepository for InMemoryRepository {
    async fn append_log(&self, entry: &ActivityLogEntry) -> Result<(), StorageError> {
        let mut guard = self.logs.lock().map_err(poisoned)?;
        if guard.iter().any(|e| e.id == entry.id) {
            return Err(StorageError::Conflict);
        }
        guard.push(entry.clone());
        Ok(())
    }

    async fn recent_logs(&self, limit: u32) -> Result<Vec<ActivityLogEntry>, StorageError> {
        let guard = self.logs.lock().map_err(poisoned)?;
        let mut indexed: Vec<(usize, &ActivityLogEntry)> = guard.iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| b.timestamp.cmp(&a.timestamp).then(ib.cmp(ia)));
        Ok(indexed
            .into_iter()
            .take(take(limit))
            .map(|(_, e)| e.clone())
            .collect())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub activity: Arc<dyn ActivityLogRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            users: Arc::new(repo.clone()),
            courses: Arc::new(repo.clone()),
            activity: Arc::new(repo),
        }
    }
}
