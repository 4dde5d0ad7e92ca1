//! Driving port for the follow graph and notifications.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{Error, FollowOutcome, Notification, UserFollowInfo, UserId, UserListing};

/// Driving port for following, user listings, and notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialCommand: Send + Sync {
    /// Follow `followed`.
    ///
    /// # Errors
    ///
    /// - [`crate::domain::ErrorCode::InvalidRequest`] for a self-follow.
    /// - [`crate::domain::ErrorCode::NotFound`] when the target is missing.
    async fn follow(&self, follower: UserId, followed: UserId) -> Result<FollowOutcome, Error>;

    /// Stop following `followed`. Returns whether an edge was removed.
    async fn unfollow(&self, follower: UserId, followed: UserId) -> Result<bool, Error>;

    /// One page of a user listing.
    async fn users(
        &self,
        listing: UserListing,
        page: PageRequest,
    ) -> Result<Page<UserFollowInfo>, Error>;

    /// One page of the user's notifications.
    async fn notifications(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<Notification>, Error>;
}
