use async_trait::async_trait;
use signal_core::model::User;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{exec, ser};
use crate::repository::{StorageError, UserRepository};

fn map_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, StorageError> {
    let username: String = row.try_get("username").map_err(ser)?;
    let about_me: String = row.try_get("about_me").map_err(ser)?;
    Ok(User::new(username).map_err(ser)?.with_about_me(about_me))
}

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn get_user(&self, username: &str) -> Result<User, StorageError> {
        let row = sqlx::query("SELECT username, about_me FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(exec)?;

        match row {
            Some(row) => map_user_row(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO users (username, about_me) VALUES (?1, ?2)")
            .bind(user.username())
            .bind(user.about_me())
            .execute(&self.pool)
            .await
            .map_err(exec)?;
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO users (username, about_me)
            VALUES (?1, ?2)
            ON CONFLICT(username) DO UPDATE SET
                about_me = excluded.about_me
            ",
        )
        .bind(user.username())
        .bind(user.about_me())
        .execute(&self.pool)
        .await
        .map_err(exec)?;
        Ok(())
    }
}
