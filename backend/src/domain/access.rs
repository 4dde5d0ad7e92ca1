//! Access evaluation for lists.
//!
//! Each check is two reads at most: one combined existence and permission
//! query, then, only on failure, an existence query telling a missing list
//! (not found) apart from one the caller cannot reach (forbidden).

use std::sync::Arc;

use tracing::debug;

use crate::domain::ports::{ListRepository, ListRepositoryError};
use crate::domain::{AccessLevel, Error, ListId, UserId};

pub(crate) const LIST_NOT_FOUND: &str = "List not found";
pub(crate) const ALREADY_COLLABORATOR: &str = "User is already a collaborator.";

/// Map list repository failures onto the domain taxonomy.
pub(crate) fn map_list_error(error: ListRepositoryError) -> Error {
    match error {
        ListRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("list repository unavailable: {message}"))
        }
        ListRepositoryError::Query { message } => {
            Error::storage(format!("list repository error: {message}"))
        }
        ListRepositoryError::DuplicateMembership => {
            Error::collaborator_already_exists(ALREADY_COLLABORATOR)
        }
        ListRepositoryError::MissingReference { message } => {
            Error::not_found(format!("referenced record not found: {message}"))
        }
    }
}

/// Classifies a caller against a list.
pub struct AccessEvaluator<L> {
    lists: Arc<L>,
}

impl<L> Clone for AccessEvaluator<L> {
    fn clone(&self) -> Self {
        Self {
            lists: Arc::clone(&self.lists),
        }
    }
}

impl<L> AccessEvaluator<L>
where
    L: ListRepository,
{
    /// Create an evaluator reading through `lists`.
    pub fn new(lists: Arc<L>) -> Self {
        Self { lists }
    }

    /// Succeeds when `user` owns `list`.
    ///
    /// # Errors
    ///
    /// Not found for a missing list, forbidden otherwise.
    pub async fn check_ownership(&self, list: ListId, user: UserId) -> Result<(), Error> {
        let owner = self
            .lists
            .is_owner(list, user)
            .await
            .map_err(map_list_error)?;
        if owner {
            return Ok(());
        }
        Err(self
            .classify_denial(list, user, "Only the list owner can do this")
            .await)
    }

    /// Succeeds when `user` owns `list` or has a membership row on it.
    ///
    /// # Errors
    ///
    /// Not found for a missing list, forbidden otherwise.
    pub async fn check_access(&self, list: ListId, user: UserId) -> Result<AccessLevel, Error> {
        let level = self
            .lists
            .access_level(list, user)
            .await
            .map_err(map_list_error)?;
        match level {
            Some(level) => Ok(level),
            None => Err(self
                .classify_denial(list, user, "You do not have access to this list")
                .await),
        }
    }

    async fn classify_denial(
        &self,
        list: ListId,
        user: UserId,
        forbidden: &str,
    ) -> Error {
        match self.lists.exists(list).await {
            Ok(true) => {
                debug!(list_id = %list, user_id = %user, "list access denied");
                Error::forbidden(forbidden)
            }
            Ok(false) => Error::not_found(LIST_NOT_FOUND),
            Err(error) => map_list_error(error),
        }
    }
}
