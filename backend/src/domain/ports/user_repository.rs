//! Port for account persistence outside identity resolution.

use async_trait::async_trait;

use crate::domain::{
    Email, PrivacySettings, PrivacySettingsUpdate, ProfileUpdate, User, UserId, Username,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The case-insensitive username index rejected the write.
        UsernameTaken => "username already taken",
    }
}

/// Port for reading and mutating user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch an account by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Whether an account with this id exists.
    async fn exists(&self, id: UserId) -> Result<bool, UserRepositoryError>;

    /// Return the account for `email`, inserting a placeholder account
    /// (no external uid, no username) when none exists.
    async fn find_or_create_placeholder(&self, email: &Email)
    -> Result<UserId, UserRepositoryError>;

    /// Whether `username` is used by an account other than `except`,
    /// compared case-insensitively.
    async fn username_taken(
        &self,
        username: &Username,
        except: UserId,
    ) -> Result<bool, UserRepositoryError>;

    /// Assign a username. Returns `false` when the account does not exist.
    ///
    /// A concurrent claim of the same name surfaces as
    /// [`UserRepositoryError::UsernameTaken`].
    async fn set_username(
        &self,
        id: UserId,
        username: &Username,
    ) -> Result<bool, UserRepositoryError>;

    /// Apply the supplied profile fields and return the updated account.
    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch privacy flags for an account.
    async fn privacy_settings(
        &self,
        id: UserId,
    ) -> Result<Option<PrivacySettings>, UserRepositoryError>;

    /// Apply the supplied privacy fields and return the stored flags.
    async fn update_privacy_settings(
        &self,
        id: UserId,
        update: &PrivacySettingsUpdate,
    ) -> Result<Option<PrivacySettings>, UserRepositoryError>;

    /// Delete an account and everything hanging off it.
    async fn delete(&self, id: UserId) -> Result<bool, UserRepositoryError>;
}
