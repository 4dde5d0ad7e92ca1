//! Account self-service: profile, username, privacy, deletion.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{AccountCommand, UserRepository, UserRepositoryError};
use crate::domain::{
    Error, PrivacySettings, PrivacySettingsUpdate, ProfileUpdate, User, UserId, Username,
};

const USERNAME_TAKEN: &str = "Username already taken";

/// Map user repository failures onto the domain taxonomy.
pub(crate) fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::storage(format!("user repository error: {message}"))
        }
        UserRepositoryError::UsernameTaken => Error::already_exists(USERNAME_TAKEN),
    }
}

/// Account service implementing [`AccountCommand`].
#[derive(Clone)]
pub struct AccountService<U> {
    users: Arc<U>,
}

impl<U> AccountService<U> {
    /// Create a new service with the given repository.
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }
}

impl<U> AccountService<U>
where
    U: UserRepository,
{
    fn user_not_found() -> Error {
        Error::not_found("User not found")
    }

    async fn load(&self, user: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user)
            .await
            .map_err(map_user_error)?
            .ok_or_else(Self::user_not_found)
    }

    async fn load_settings(&self, user: UserId) -> Result<PrivacySettings, Error> {
        self.users
            .privacy_settings(user)
            .await
            .map_err(map_user_error)?
            .ok_or_else(Self::user_not_found)
    }
}

#[async_trait]
impl<U> AccountCommand for AccountService<U>
where
    U: UserRepository,
{
    async fn profile(&self, user: UserId) -> Result<User, Error> {
        self.load(user).await
    }

    async fn update_profile(&self, user: UserId, update: ProfileUpdate) -> Result<User, Error> {
        if update.is_empty() {
            return self.load(user).await;
        }
        self.users
            .update_profile(user, &update)
            .await
            .map_err(map_user_error)?
            .ok_or_else(Self::user_not_found)
    }

    async fn set_username(&self, user: UserId, username: Username) -> Result<User, Error> {
        let taken = self
            .users
            .username_taken(&username, user)
            .await
            .map_err(map_user_error)?;
        if taken {
            return Err(Error::already_exists(USERNAME_TAKEN));
        }
        let updated = self
            .users
            .set_username(user, &username)
            .await
            .map_err(map_user_error)?;
        if !updated {
            return Err(Self::user_not_found());
        }
        self.load(user).await
    }

    async fn privacy_settings(&self, user: UserId) -> Result<PrivacySettings, Error> {
        self.load_settings(user).await
    }

    async fn update_privacy_settings(
        &self,
        user: UserId,
        update: PrivacySettingsUpdate,
    ) -> Result<PrivacySettings, Error> {
        if update.is_empty() {
            return self.load_settings(user).await;
        }
        self.users
            .update_privacy_settings(user, &update)
            .await
            .map_err(map_user_error)?
            .ok_or_else(Self::user_not_found)
    }

    async fn delete_account(&self, user: UserId) -> Result<(), Error> {
        let deleted = self.users.delete(user).await.map_err(map_user_error)?;
        if !deleted {
            return Err(Self::user_not_found());
        }
        info!(user_id = %user, "account deleted");
        Ok(())
    }

    async fn view_profile(&self, viewer: UserId, target: UserId) -> Result<User, Error> {
        let profile = self.load(target).await?;
        if viewer != target {
            let settings = self.load_settings(target).await?;
            if !settings.profile_is_public {
                return Err(Error::forbidden("This profile is private"));
            }
        }
        Ok(profile)
    }
}
