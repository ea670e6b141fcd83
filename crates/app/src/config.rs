use std::path::{Path, PathBuf};

use services::ai::AiConfig;
use storage::repository::StorageError;

pub const DEFAULT_DB_URL: &str = "sqlite://signal.sqlite3";
pub const DEFAULT_LOG_FILTER: &str = "app=info,services=info,storage=warn";

/// Runtime settings resolved from the environment and the command line.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_url: String,
    pub ai: Option<AiConfig>,
}

impl AppConfig {
    /// Resolve settings; `db_override` (from `--db`) wins over `SIGNAL_DB_URL`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` when `SIGNAL_DB_URL` is set but blank.
    pub fn resolve(db_override: Option<String>) -> Result<Self, StorageError> {
        let db_url = match db_override {
            Some(url) => url,
            None => match std::env::var("SIGNAL_DB_URL") {
                Ok(url) if url.trim().is_empty() => {
                    return Err(StorageError::Unavailable(
                        "SIGNAL_DB_URL is set but empty".into(),
                    ));
                }
                Ok(url) => url,
                Err(_) => DEFAULT_DB_URL.into(),
            },
        };
        Ok(Self {
            db_url: normalize_sqlite_url(db_url),
            ai: AiConfig::from_env(),
        })
    }
}

fn is_in_memory(url: &str) -> bool {
    url == "sqlite::memory:" || url.contains("mode=memory")
}

/// Rewrite relative file URLs as `sqlite://<absolute path>`.
pub fn normalize_sqlite_url(raw: String) -> String {
    if is_in_memory(&raw) || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and its directory) so `SQLite` can open it.
///
/// # Errors
///
/// Returns `StorageError::Unavailable` for URLs without a file path, or an I/O error.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if is_in_memory(db_url) {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| StorageError::Unavailable(format!("unsupported database url: {db_url}")))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(StorageError::Unavailable(format!("database url has no path: {db_url}")).into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_and_absolute_urls_are_untouched() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:file:x?mode=memory&cache=shared".into()),
            "sqlite:file:x?mode=memory&cache=shared"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/signal.db".into()),
            "sqlite:///tmp/signal.db"
        );
    }

    #[test]
    fn relative_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/signal.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/signal.sqlite3"));
    }

    #[test]
    fn prepare_rejects_pathless_urls() {
        assert!(prepare_sqlite_file("sqlite://").is_err());
        assert!(prepare_sqlite_file("postgres://db").is_err());
        assert!(prepare_sqlite_file("sqlite::memory:").is_ok());
    }
}
