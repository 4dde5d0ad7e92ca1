//! Driving port for account self-service.

use async_trait::async_trait;

use crate::domain::{
    Error, PrivacySettings, PrivacySettingsUpdate, ProfileUpdate, User, UserId, Username,
};

/// Driving port for profile, username, privacy, and account deletion.
///
/// Every operation acts on the authenticated caller except
/// [`AccountCommand::view_profile`], which reads another user's profile
/// subject to their privacy flags.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// The caller's own profile.
    async fn profile(&self, user: UserId) -> Result<User, Error>;

    /// Apply a partial profile update. An empty update returns the profile
    /// unchanged.
    async fn update_profile(&self, user: UserId, update: ProfileUpdate) -> Result<User, Error>;

    /// Claim a username.
    ///
    /// # Errors
    ///
    /// [`crate::domain::ErrorCode::AlreadyExists`] when another account
    /// holds the name in any letter case.
    async fn set_username(&self, user: UserId, username: Username) -> Result<User, Error>;

    /// The caller's privacy flags.
    async fn privacy_settings(&self, user: UserId) -> Result<PrivacySettings, Error>;

    /// Apply a partial privacy update.
    async fn update_privacy_settings(
        &self,
        user: UserId,
        update: PrivacySettingsUpdate,
    ) -> Result<PrivacySettings, Error>;

    /// Delete the caller's account and everything it owns.
    async fn delete_account(&self, user: UserId) -> Result<(), Error>;

    /// Read `target`'s profile as `viewer`.
    ///
    /// # Errors
    ///
    /// [`crate::domain::ErrorCode::Forbidden`] when the profile is private
    /// and the viewer is someone else.
    async fn view_profile(&self, viewer: UserId, target: UserId) -> Result<User, Error>;
}
