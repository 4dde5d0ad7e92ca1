//! List lifecycle, collaborator membership, and discovery.
//!
//! Ownership and access are checked through [`AccessEvaluator`] before any
//! mutation. The owner is never stored as a membership row; collaborator
//! operations special-case them instead.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use tracing::info;

use crate::domain::access::{ALREADY_COLLABORATOR, LIST_NOT_FOUND, map_list_error};
use crate::domain::account_service::map_user_error;
use crate::domain::ports::{ListCommand, ListRepository, UserRepository};
use crate::domain::{
    AccessEvaluator, CollaboratorRole, Email, Error, ListDetails, ListId, ListMember, ListQuery,
    ListSummary, ListUpdate, NewList, PlaceList, UserId,
};

const OWNER_IS_COLLABORATOR: &str = "Owner is already a collaborator.";

/// List service implementing [`ListCommand`].
pub struct ListService<L, U> {
    lists: Arc<L>,
    users: Arc<U>,
    access: AccessEvaluator<L>,
}

impl<L, U> ListService<L, U>
where
    L: ListRepository,
    U: UserRepository,
{
    /// Create a new service with the given repositories.
    pub fn new(lists: Arc<L>, users: Arc<U>) -> Self {
        Self {
            access: AccessEvaluator::new(Arc::clone(&lists)),
            lists,
            users,
        }
    }

    async fn load(&self, list: ListId) -> Result<PlaceList, Error> {
        self.lists
            .find_by_id(list)
            .await
            .map_err(map_list_error)?
            .ok_or_else(|| Error::not_found(LIST_NOT_FOUND))
    }

    async fn details(&self, list: PlaceList, viewer: UserId) -> Result<ListDetails, Error> {
        let collaborators = self
            .lists
            .collaborator_emails(list.id)
            .await
            .map_err(map_list_error)?;
        Ok(ListDetails::for_viewer(list, collaborators, viewer))
    }

    /// Delete `target`'s membership. Returns `false` for the owner and for
    /// users without a row.
    async fn remove_membership(&self, list: &PlaceList, target: UserId) -> Result<bool, Error> {
        if list.owner_id == target {
            return Ok(false);
        }
        self.lists
            .delete_membership(list.id, target)
            .await
            .map_err(map_list_error)
    }
}

#[async_trait]
impl<L, U> ListCommand for ListService<L, U>
where
    L: ListRepository,
    U: UserRepository,
{
    async fn create_list(&self, list: NewList) -> Result<ListDetails, Error> {
        let owner = list.owner_id;
        let created = self.lists.insert(&list).await.map_err(map_list_error)?;
        info!(list_id = %created.id, owner_id = %owner, "list created");
        Ok(ListDetails::for_viewer(created, Vec::new(), owner))
    }

    async fn get_list(&self, list: ListId, viewer: UserId) -> Result<ListDetails, Error> {
        self.access.check_access(list, viewer).await?;
        let row = self.load(list).await?;
        self.details(row, viewer).await
    }

    async fn update_list(
        &self,
        list: ListId,
        actor: UserId,
        update: ListUpdate,
    ) -> Result<ListDetails, Error> {
        self.access.check_ownership(list, actor).await?;
        let row = if update.is_empty() {
            self.load(list).await?
        } else {
            self.lists
                .update(list, &update)
                .await
                .map_err(map_list_error)?
                .ok_or_else(|| Error::not_found(LIST_NOT_FOUND))?
        };
        self.details(row, actor).await
    }

    async fn delete_list(&self, list: ListId, actor: UserId) -> Result<(), Error> {
        self.access.check_ownership(list, actor).await?;
        let deleted = self.lists.delete(list).await.map_err(map_list_error)?;
        if !deleted {
            return Err(Error::not_found(LIST_NOT_FOUND));
        }
        info!(list_id = %list, "list deleted");
        Ok(())
    }

    async fn add_collaborator(
        &self,
        list: ListId,
        actor: UserId,
        email: Email,
    ) -> Result<UserId, Error> {
        self.access.check_ownership(list, actor).await?;
        let target = self
            .users
            .find_or_create_placeholder(&email)
            .await
            .map_err(map_user_error)?;
        let owner = self
            .lists
            .is_owner(list, target)
            .await
            .map_err(map_list_error)?;
        if owner {
            return Err(Error::collaborator_already_exists(OWNER_IS_COLLABORATOR));
        }
        let member = self
            .lists
            .membership_exists(list, target)
            .await
            .map_err(map_list_error)?;
        if member {
            return Err(Error::collaborator_already_exists(ALREADY_COLLABORATOR));
        }
        // A concurrent invite that slips past the check above trips the
        // membership unique key, which maps to the same error.
        self.lists
            .insert_membership(list, target, CollaboratorRole::default())
            .await
            .map_err(map_list_error)?;
        info!(list_id = %list, user_id = %target, "collaborator added");
        Ok(target)
    }

    async fn remove_collaborator(
        &self,
        list: ListId,
        actor: UserId,
        target: UserId,
    ) -> Result<(), Error> {
        self.access.check_ownership(list, actor).await?;
        let row = self.load(list).await?;
        if self.remove_membership(&row, target).await? {
            info!(list_id = %list, user_id = %target, "collaborator removed");
            return Ok(());
        }
        if row.owner_id == target {
            return Err(Error::invalid_request(
                "Cannot remove the list owner as a collaborator.",
            ));
        }
        let known = self.users.exists(target).await.map_err(map_user_error)?;
        if known {
            Err(Error::not_found("User is not a collaborator on this list."))
        } else {
            Err(Error::not_found("Collaborator user not found."))
        }
    }

    async fn members(&self, list: ListId, viewer: UserId) -> Result<Vec<ListMember>, Error> {
        self.access.check_access(list, viewer).await?;
        self.lists.members(list).await.map_err(map_list_error)
    }

    async fn add_member(
        &self,
        list: ListId,
        actor: UserId,
        target: UserId,
        role: CollaboratorRole,
    ) -> Result<Vec<ListMember>, Error> {
        if role == CollaboratorRole::Owner {
            return Err(Error::invalid_request("The owner role cannot be granted"));
        }
        self.access.check_ownership(list, actor).await?;
        let known = self.users.exists(target).await.map_err(map_user_error)?;
        if !known {
            return Err(Error::not_found("User not found"));
        }
        if target == actor {
            return Err(Error::collaborator_already_exists(OWNER_IS_COLLABORATOR));
        }
        self.lists
            .upsert_membership(list, target, role)
            .await
            .map_err(map_list_error)?;
        self.lists.members(list).await.map_err(map_list_error)
    }

    async fn lists(
        &self,
        query: ListQuery,
        page: PageRequest,
    ) -> Result<Page<ListSummary>, Error> {
        self.lists.page(&query, page).await.map_err(map_list_error)
    }
}

#[cfg(test)]
#[path = "list_service_tests.rs"]
mod tests;
