use super::check_len;
use crate::error::{AppError, Result};
use crate::models::{Role, User, USERNAME_MAX_LEN};
use crate::traits::MediaRepo;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Minimal account records. Credentials and sessions live upstream; this
/// only keeps identities and roles so ownership and cascades hold.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn MediaRepo>,
}

impl UserService {
    pub fn new(repo: Arc<dyn MediaRepo>) -> Self {
        Self { repo }
    }

    /// Duplicate usernames come back from the store as `AppError::Conflict`.
    pub async fn register(&self, username: &str, role: Role) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::ValidationError("username is required".into()));
        }
        check_len("username", username, USERNAME_MAX_LEN)?;

        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            role,
            created_at: Utc::now(),
        };
        self.repo.create_user(user.clone()).await?;
        log::info!("registered {} '{}' as {}", user.id, user.username, role);
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.repo
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    /// Deletes the user together with their media, comments and ratings.
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        if !self.repo.delete_user(id).await? {
            return Err(AppError::not_found("User", id));
        }
        log::info!("removed user {id} and everything they owned");
        Ok(())
    }

    /// Identifies the user a request is made on behalf of.
    pub async fn resolve(&self, id: Uuid) -> Result<User> {
        match self.repo.get_user(id).await? {
            Some(user) => Ok(user),
            None => Err(AppError::Unauthorized(format!("unknown user {id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockMediaRepo;

    #[tokio::test]
    async fn register_trims_and_stores() {
        let mut repo = MockMediaRepo::new();
        repo.expect_create_user()
            .withf(|u| u.username == "mira" && u.role == Role::Consumer)
            .times(1)
            .returning(|_| Ok(()));
        let user = UserService::new(Arc::new(repo))
            .register("  mira ", Role::Consumer)
            .await
            .unwrap();
        assert_eq!(user.username, "mira");
    }

    #[tokio::test]
    async fn blank_username_is_rejected() {
        let err = UserService::new(Arc::new(MockMediaRepo::new()))
            .register(" ", Role::Creator)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn unknown_caller_is_unauthorized() {
        let mut repo = MockMediaRepo::new();
        repo.expect_get_user().returning(|_| Ok(None));
        let err = UserService::new(Arc::new(repo))
            .resolve(Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn removing_a_missing_user_is_not_found() {
        let mut repo = MockMediaRepo::new();
        repo.expect_delete_user().returning(|_| Ok(false));
        let err = UserService::new(Arc::new(repo))
            .remove(Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }
}
