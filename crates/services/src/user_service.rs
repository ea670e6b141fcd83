use std::sync::Arc;

use signal_core::model::{ActivityDraft, ActivityEventType, User};
use storage::repository::{StorageError, UserRepository};
use tracing::info;

use crate::activity_service::ActivityService;
use crate::error::UserServiceError;

/// Learner accounts keyed by username. No passwords.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    activity: ActivityService,
}

impl UserService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, activity: ActivityService) -> Self {
        Self { users, activity }
    }

    /// Fetch the user, creating an empty profile on first sight.
    ///
    /// Returns the user and whether it was created by this call.
    async fn get_or_create(&self, username: &str) -> Result<(User, bool), UserServiceError> {
        let candidate = User::new(username)?;
        match self.users.get_user(candidate.username()).await {
            Ok(user) => Ok((user, false)),
            Err(StorageError::NotFound) => match self.users.insert_user(&candidate).await {
                Ok(()) => Ok((candidate, true)),
                // Lost a race with a concurrent signup.
                Err(StorageError::Conflict) => {
                    Ok((self.users.get_user(candidate.username()).await?, false))
                }
                Err(err) => Err(err.into()),
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Sign in, creating the account if needed.
    ///
    /// Logs `signup` for new accounts and `login` every time.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::User` for a blank username.
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn login(&self, username: &str) -> Result<User, UserServiceError> {
        let (user, created) = self.get_or_create(username).await?;
        if created {
            self.activity
                .log_event(ActivityEventType::Signup, ActivityDraft::for_user(user.username()))
                .await?;
            info!(user = user.username(), "new learner signed up");
        }
        self.activity
            .log_event(ActivityEventType::Login, ActivityDraft::for_user(user.username()))
            .await?;
        info!(user = user.username(), "learner logged in");
        Ok(user)
    }

    /// Replace the learner's "about me" text.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::User` for a blank username.
    /// Returns `UserServiceError::Storage` if repository access fails.
    pub async fn update_profile(
        &self,
        username: &str,
        about_me: &str,
    ) -> Result<User, UserServiceError> {
        let (user, _) = self.get_or_create(username).await?;
        let updated = user.with_about_me(about_me.trim());
        self.users.upsert_user(&updated).await?;
        self.activity
            .log_event(
                ActivityEventType::ProfileUpdate,
                ActivityDraft::for_user(updated.username()),
            )
            .await?;
        info!(user = updated.username(), "profile updated");
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::Storage` (including `NotFound`) on failure.
    pub async fn get_user(&self, username: &str) -> Result<User, UserServiceError> {
        Ok(self.users.get_user(username.trim()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn service(repo: &InMemoryRepository) -> (UserService, ActivityService) {
        let activity = ActivityService::new(fixed_clock(), Arc::new(repo.clone()));
        (UserService::new(Arc::new(repo.clone()), activity.clone()), activity)
    }

    #[tokio::test]
    async fn first_login_signs_up_then_logs_in() {
        let repo = InMemoryRepository::new();
        let (users, activity) = service(&repo);

        let user = users.login("  ada ").await.unwrap();
        assert_eq!(user.username(), "ada");
        users.login("ada").await.unwrap();

        let kinds: Vec<ActivityEventType> = activity
            .recent(10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(kinds.iter().filter(|k| **k == ActivityEventType::Signup).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == ActivityEventType::Login).count(), 2);
    }

    #[tokio::test]
    async fn blank_username_is_rejected() {
        let repo = InMemoryRepository::new();
        let (users, _) = service(&repo);
        assert!(matches!(
            users.login("   ").await,
            Err(UserServiceError::User(_))
        ));
    }

    #[tokio::test]
    async fn update_profile_persists_learner_context() {
        let repo = InMemoryRepository::new();
        let (users, _) = service(&repo);
        users.login("ada").await.unwrap();

        let updated = users.update_profile("ada", " ICU nurse ").await.unwrap();
        assert_eq!(updated.learner_context(), Some("ICU nurse"));
        assert_eq!(users.get_user("ada").await.unwrap().about_me(), "ICU nurse");
    }
}
