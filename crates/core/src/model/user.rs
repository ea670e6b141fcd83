use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("username cannot be empty")]
    EmptyUsername,
}

/// A learner account. `about_me` is passed to generation as learner context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    username: String,
    #[serde(default)]
    about_me: String,
}

impl User {
    /// # Errors
    ///
    /// Returns `UserError::EmptyUsername` when the trimmed name is empty.
    pub fn new(username: impl AsRef<str>) -> Result<Self, UserError> {
        let username = username.as_ref().trim();
        if username.is_empty() {
            return Err(UserError::EmptyUsername);
        }
        Ok(Self {
            username: username.to_owned(),
            about_me: String::new(),
        })
    }

    #[must_use]
    pub fn with_about_me(mut self, about_me: impl Into<String>) -> Self {
        self.about_me = about_me.into();
        self
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn about_me(&self) -> &str {
        &self.about_me
    }

    /// Learner context for generation, `None` when blank.
    #[must_use]
    pub fn learner_context(&self) -> Option<&str> {
        let trimmed = self.about_me.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
