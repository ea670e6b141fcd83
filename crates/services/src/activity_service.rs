use std::sync::Arc;

use signal_core::model::{ActivityDraft, ActivityEventType, ActivityLogEntry};
use storage::repository::{ActivityLogRepository, StorageError};
use tracing::debug;

use crate::Clock;

/// Append-only sink for learner activity.
#[derive(Clone)]
pub struct ActivityService {
    clock: Clock,
    logs: Arc<dyn ActivityLogRepository>,
}

impl ActivityService {
    #[must_use]
    pub fn new(clock: Clock, logs: Arc<dyn ActivityLogRepository>) -> Self {
        Self { clock, logs }
    }

    /// Stamp `draft` with a fresh id and the current time, then append it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    pub async fn log_event(
        &self,
        event_type: ActivityEventType,
        draft: ActivityDraft,
    ) -> Result<ActivityLogEntry, StorageError> {
        let entry = ActivityLogEntry::stamped(event_type, self.clock.now(), draft);
        self.logs.append_log(&entry).await?;
        debug!(event = %entry.event_type, user = entry.user(), id = %entry.id, "activity logged");
        Ok(entry)
    }

    /// Newest entries first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the log cannot be read.
    pub async fn recent(&self, limit: u32) -> Result<Vec<ActivityLogEntry>, StorageError> {
        self.logs.recent_logs(limit).await
    }
}
