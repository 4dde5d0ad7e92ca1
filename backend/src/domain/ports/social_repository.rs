//! Port for the follow graph and notifications.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{Notification, UserFollowInfo, UserId, UserListing};

use super::define_port_error;

define_port_error! {
    /// Errors raised by social repository adapters.
    pub enum SocialRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "social repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "social repository query failed: {message}",
        /// One side of the follow edge does not exist.
        UnknownUser => "follow references a missing user",
    }
}

/// Port for follow edges, user listings, and notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialRepository: Send + Sync {
    /// Insert a follow edge. Returns `false` when it already existed.
    async fn insert_follow(
        &self,
        follower: UserId,
        followed: UserId,
    ) -> Result<bool, SocialRepositoryError>;

    /// Delete a follow edge. Returns whether one was removed.
    async fn delete_follow(
        &self,
        follower: UserId,
        followed: UserId,
    ) -> Result<bool, SocialRepositoryError>;

    /// One page of users for a listing, ordered by username then display name.
    async fn users(
        &self,
        listing: &UserListing,
        request: PageRequest,
    ) -> Result<Page<UserFollowInfo>, SocialRepositoryError>;

    /// One page of a user's notifications, newest first.
    async fn notifications(
        &self,
        user: UserId,
        request: PageRequest,
    ) -> Result<Page<Notification>, SocialRepositoryError>;
}
