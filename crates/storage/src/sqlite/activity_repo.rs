use async_trait::async_trait;
use signal_core::model::ActivityLogEntry;

use super::SqliteRepository;
use super::mapping::{exec, map_documents, to_document};
use crate::repository::{ActivityLogRepository, StorageError};

#[async_trait]
impl ActivityLogRepository for SqliteRepository {
    async fn append_log(&self, entry: &ActivityLogEntry) -> Result<(), StorageError> {
        let document = to_document(entry)?;

        sqlx::query(
            r"
            INSERT INTO activity_logs (id, event_type, username, timestamp, document)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(entry.id.as_str())
        .bind(entry.event_type.as_str())
        .bind(entry.payload.user.as_deref())
        .bind(entry.timestamp.as_str())
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(exec)?;

        Ok(())
    }

    async fn recent_logs(&self, limit: u32) -> Result<Vec<ActivityLogEntry>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT document
            FROM activity_logs
            ORDER BY timestamp DESC, seq DESC
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
