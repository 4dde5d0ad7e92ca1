//! Follow graph and notification read models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{SearchTerm, UserId};

/// A user as shown in follow listings and search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserFollowInfo {
    /// User id.
    #[schema(value_type = i64)]
    pub id: UserId,
    /// Email.
    pub email: String,
    /// Username, if chosen.
    pub username: Option<String>,
    /// Display name, if set.
    pub display_name: Option<String>,
    /// Profile picture reference, if set.
    pub profile_picture_url: Option<String>,
    /// Whether the viewer follows this user.
    pub is_following: bool,
}

/// User listings sharing the paging contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserListing {
    /// Users the given user follows.
    Following(UserId),
    /// Users following the given user, flagged with follow-back status.
    Followers(UserId),
    /// Email/username substring search excluding the viewer.
    Search {
        /// What to match.
        term: SearchTerm,
        /// The searching user.
        viewer: UserId,
    },
}

/// A notification addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Identifier.
    pub id: i64,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Read flag.
    pub is_read: bool,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

/// Result of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowOutcome {
    /// True when the edge already existed before the request.
    pub already_following: bool,
}
