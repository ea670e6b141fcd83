use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps an execution failure; unique-key violations become `Conflict`.
pub(crate) fn exec(e: sqlx::Error) -> StorageError {
    if e
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
    {
        return StorageError::Conflict;
    }
    StorageError::Unavailable(e.to_string())
}

pub(crate) fn to_document<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

pub(crate) fn from_document<T: DeserializeOwned>(row: &SqliteRow) -> Result<T, StorageError> {
    let raw: String = row.try_get("document").map_err(ser)?;
    serde_json::from_str(&raw).map_err(ser)
}

pub(crate) fn map_documents<T: DeserializeOwned>(
    rows: &[SqliteRow],
) -> Result<Vec<T>, StorageError> {
    rows.iter().map(from_document).collect()
}
