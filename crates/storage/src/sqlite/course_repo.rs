use async_trait::async_trait;
use chrono::{DateTime, Utc};
use signal_core::model::{Course, CourseId};

use super::SqliteRepository;
use super::mapping::{exec, from_document, map_documents, to_document};
use crate::repository::{CourseRepository, StorageError};

#[async_trait]
impl CourseRepository for SqliteRepository {
    async fn upsert_course(
        &self,
        course: &Course,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let document = to_document(course)?;

        sqlx::query(
            r"
            INSERT INTO courses (course_id, owner, created_at, saved_at_ms, document)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(course_id) DO UPDATE SET
                owner = excluded.owner,
                created_at = excluded.created_at,
                saved_at_ms = excluded.saved_at_ms,
                document = excluded.document
            ",
        )
        .bind(course.course_id.as_str())
        .bind(course.owner())
        .bind(course.created_at)
        .bind(saved_at.timestamp_millis())
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(exec)?;

        Ok(())
    }

    async fn get_course(&self, id: &CourseId) -> Result<Course, StorageError> {
        let row = sqlx::query("SELECT document FROM courses WHERE course_id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(exec)?;

        match row {
            Some(row) => from_document(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn courses_for_user(&self, owner: &str) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT document
            FROM courses
            WHERE owner = ?1
            ORDER BY created_at ASC, course_id ASC
            ",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(exec)?;

        map_documents(&rows)
    }

    async fn recent_courses(&self, limit: u32) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT document
            FROM courses
            ORDER BY saved_at_ms DESC, course_id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(exec)?;

        map_documents(&rows)
    }
}
