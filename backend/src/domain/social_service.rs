//! Follow graph, user listings, and notifications.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use tracing::debug;

use crate::domain::account_service::map_user_error;
use crate::domain::ports::{SocialCommand, SocialRepository, SocialRepositoryError, UserRepository};
use crate::domain::{Error, FollowOutcome, Notification, UserFollowInfo, UserId, UserListing};

/// Social service implementing [`SocialCommand`].
#[derive(Clone)]
pub struct SocialService<S, U> {
    social: Arc<S>,
    users: Arc<U>,
}

impl<S, U> SocialService<S, U> {
    /// Create a new service with the given repositories.
    pub fn new(social: Arc<S>, users: Arc<U>) -> Self {
        Self { social, users }
    }
}

impl<S, U> SocialService<S, U>
where
    S: SocialRepository,
    U: UserRepository,
{
    fn map_social_error(error: SocialRepositoryError) -> Error {
        match error {
            SocialRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("social repository unavailable: {message}"))
            }
            SocialRepositoryError::Query { message } => {
                Error::storage(format!("social repository error: {message}"))
            }
            SocialRepositoryError::UnknownUser => Error::not_found("User not found"),
        }
    }

    async fn user_exists(&self, user: UserId) -> Result<bool, Error> {
        self.users.exists(user).await.map_err(map_user_error)
    }
}

#[async_trait]
impl<S, U> SocialCommand for SocialService<S, U>
where
    S: SocialRepository,
    U: UserRepository,
{
    async fn follow(&self, follower: UserId, followed: UserId) -> Result<FollowOutcome, Error> {
        if follower == followed {
            return Err(Error::invalid_request("You cannot follow yourself"));
        }
        if !self.user_exists(followed).await? {
            return Err(Error::not_found("User to follow not found"));
        }
        let inserted = self
            .social
            .insert_follow(follower, followed)
            .await
            .map_err(Self::map_social_error)?;
        debug!(%follower, %followed, inserted, "follow recorded");
        Ok(FollowOutcome {
            already_following: !inserted,
        })
    }

    async fn unfollow(&self, follower: UserId, followed: UserId) -> Result<bool, Error> {
        if follower == followed {
            return Err(Error::invalid_request("You cannot unfollow yourself"));
        }
        let removed = self
            .social
            .delete_follow(follower, followed)
            .await
            .map_err(Self::map_social_error)?;
        if removed || self.user_exists(followed).await? {
            Ok(removed)
        } else {
            Err(Error::not_found("User to unfollow not found"))
        }
    }

    async fn users(
        &self,
        listing: UserListing,
        page: PageRequest,
    ) -> Result<Page<UserFollowInfo>, Error> {
        self.social
            .users(&listing, page)
            .await
            .map_err(Self::map_social_error)
    }

    async fn notifications(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<Page<Notification>, Error> {
        self.social
            .notifications(user, page)
            .await
            .map_err(Self::map_social_error)
    }
}
