//! User identity and account data model.
//!
//! Input values (usernames, display names, emails) are validated newtypes.
//! Read models carry plain strings so that rows written before a rule was
//! tightened still load.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Patch;

/// Maximum username length in characters.
pub const USERNAME_MAX: usize = 30;
/// Maximum display name length in characters.
pub const DISPLAY_NAME_MAX: usize = 50;
/// Maximum email length in characters.
pub const EMAIL_MAX: usize = 320;

/// Validation errors for user input values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The verified identity carried no external uid.
    #[error("verified identity is missing a uid")]
    MissingUid,
    /// The verified identity carried no email.
    #[error("verified identity is missing an email")]
    MissingEmail,
    /// Email is not of the form `local@domain`.
    #[error("email address is invalid")]
    InvalidEmail,
    /// Username is empty.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Username exceeds [`USERNAME_MAX`].
    #[error("username must be at most {max} characters")]
    UsernameTooLong {
        /// Upper bound.
        max: usize,
    },
    /// Username contains characters outside `[a-zA-Z0-9._]`.
    #[error("username may only contain letters, numbers, dots, or underscores")]
    UsernameInvalidCharacters,
    /// Display name is blank.
    #[error("display name must not be empty")]
    EmptyDisplayName,
    /// Display name exceeds [`DISPLAY_NAME_MAX`].
    #[error("display name must be at most {max} characters")]
    DisplayNameTooLong {
        /// Upper bound.
        max: usize,
    },
}

/// Internal numeric user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw database identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier issued by the upstream identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalUid(String);

impl ExternalUid {
    /// Wrap a verified uid; blank values are treated as missing.
    ///
    /// # Errors
    /// [`UserValidationError::MissingUid`] when the value is blank.
    pub fn new(uid: impl Into<String>) -> Result<Self, UserValidationError> {
        let uid = uid.into();
        if uid.trim().is_empty() {
            return Err(UserValidationError::MissingUid);
        }
        Ok(Self(uid))
    }
}

impl AsRef<str> for ExternalUid {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Email address used for account linkage and collaborator invites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate an email address.
    ///
    /// Only the shape `local@domain` is checked; deliverability is the
    /// identity provider's concern.
    ///
    /// # Errors
    /// [`UserValidationError::InvalidEmail`] for malformed input.
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        let email = email.into().trim().to_owned();
        let valid = email.chars().count() <= EMAIL_MAX
            && !email.chars().any(char::is_whitespace)
            && email
                .split_once('@')
                .is_some_and(|(local, domain)| {
                    !local.is_empty() && !domain.is_empty() && !domain.contains('@')
                });
        if valid {
            Ok(Self(email))
        } else {
            Err(UserValidationError::InvalidEmail)
        }
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// ASCII letters, digits, `.` and `_`.
const fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_'
}

/// Public handle chosen by the user. Unique case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a username.
    ///
    /// # Errors
    /// Returns the first rule the input breaks.
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        let username = username.into();
        if username.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if username.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username.chars().all(is_username_char) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(username))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Human readable name shown next to the username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a display name.
    ///
    /// # Errors
    /// Rejects blank names and names longer than [`DISPLAY_NAME_MAX`].
    pub fn new(display_name: impl Into<String>) -> Result<Self, UserValidationError> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if display_name.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(display_name))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Account read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Internal identifier.
    #[schema(value_type = i64, example = 42)]
    pub id: UserId,
    /// Account email.
    pub email: String,
    /// Chosen username, unset until the user picks one.
    pub username: Option<String>,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Optional profile picture reference.
    pub profile_picture_url: Option<String>,
}

impl User {
    /// Whether the user still has to choose a username.
    #[must_use]
    pub fn needs_username(&self) -> bool {
        self.username.is_none()
    }
}

/// Privacy flags stored per user. All default to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettings {
    /// Other users may view the profile.
    pub profile_is_public: bool,
    /// Lists are visible on the public profile.
    pub lists_are_public: bool,
    /// Usage analytics may be collected.
    pub allow_analytics: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            profile_is_public: true,
            lists_are_public: true,
            allow_analytics: true,
        }
    }
}

/// Partial privacy update. [`Patch::Null`] restores the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivacySettingsUpdate {
    /// Change to `profile_is_public`.
    pub profile_is_public: Patch<bool>,
    /// Change to `lists_are_public`.
    pub lists_are_public: Patch<bool>,
    /// Change to `allow_analytics`.
    pub allow_analytics: Patch<bool>,
}

impl PrivacySettingsUpdate {
    /// True when no field was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.profile_is_public.is_set()
            || self.lists_are_public.is_set()
            || self.allow_analytics.is_set())
    }

    /// Apply the update to the current settings.
    #[must_use]
    pub fn apply(&self, current: PrivacySettings) -> PrivacySettings {
        let defaults = PrivacySettings::default();
        let pick = |patch: &Patch<bool>, now: bool, default: bool| match patch {
            Patch::Unset => now,
            Patch::Null => default,
            Patch::Value(value) => *value,
        };
        PrivacySettings {
            profile_is_public: pick(
                &self.profile_is_public,
                current.profile_is_public,
                defaults.profile_is_public,
            ),
            lists_are_public: pick(
                &self.lists_are_public,
                current.lists_are_public,
                defaults.lists_are_public,
            ),
            allow_analytics: pick(
                &self.allow_analytics,
                current.allow_analytics,
                defaults.allow_analytics,
            ),
        }
    }
}

/// Partial profile update. [`Patch::Null`] clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Change to the display name.
    pub display_name: Patch<DisplayName>,
    /// Change to the profile picture reference.
    pub profile_picture_url: Patch<String>,
}

impl ProfileUpdate {
    /// True when no field was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.display_name.is_set() || self.profile_picture_url.is_set())
    }
}

/// Identity asserted by the upstream verifier for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Provider-issued uid.
    pub uid: Option<String>,
    /// Verified email.
    pub email: Option<String>,
    /// Name claim, if any.
    pub name: Option<String>,
    /// Picture claim, if any.
    pub picture: Option<String>,
}

/// Fields for a user created on first sight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Provider-issued uid.
    pub external_uid: ExternalUid,
    /// Account email.
    pub email: Email,
    /// Initial display name from the name claim.
    pub display_name: Option<String>,
    /// Initial picture from the picture claim.
    pub profile_picture_url: Option<String>,
}

impl NewUser {
    /// Validate a verified identity into the fields needed to link or create
    /// an account.
    ///
    /// # Errors
    /// Missing uid or email, or a malformed email.
    pub fn from_identity(identity: VerifiedIdentity) -> Result<Self, UserValidationError> {
        let uid = identity.uid.ok_or(UserValidationError::MissingUid)?;
        let email = identity.email.ok_or(UserValidationError::MissingEmail)?;
        Ok(Self {
            external_uid: ExternalUid::new(uid)?,
            email: Email::new(email)?,
            display_name: identity.name.filter(|name| !name.trim().is_empty()),
            profile_picture_url: identity.picture.filter(|url| !url.trim().is_empty()),
        })
    }
}

/// Outcome of identity resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedUser {
    /// Internal identifier of the resolved account.
    #[schema(value_type = i64)]
    pub user_id: UserId,
    /// True while the account has no username.
    pub needs_username: bool,
}
