//! Driving port for list management and discovery.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    CollaboratorRole, Email, Error, ListDetails, ListId, ListMember, ListQuery, ListSummary,
    ListUpdate, NewList, UserId,
};

/// Driving port for lists and their memberships.
///
/// `actor` and `viewer` are the authenticated caller. Mutations require
/// ownership; reads require ownership or a membership row. A list the caller
/// cannot reach yields forbidden, and a list that does not exist yields not
/// found.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListCommand: Send + Sync {
    /// Create a list owned by `list.owner_id`.
    async fn create_list(&self, list: NewList) -> Result<ListDetails, Error>;

    /// Details and collaborator emails.
    async fn get_list(&self, list: ListId, viewer: UserId) -> Result<ListDetails, Error>;

    /// Apply a partial update. An empty update returns current details.
    async fn update_list(
        &self,
        list: ListId,
        actor: UserId,
        update: ListUpdate,
    ) -> Result<ListDetails, Error>;

    /// Delete the list with its places and memberships.
    async fn delete_list(&self, list: ListId, actor: UserId) -> Result<(), Error>;

    /// Invite a collaborator by email, creating a placeholder account when
    /// the address is unknown. Returns the collaborator's user id.
    ///
    /// # Errors
    ///
    /// [`crate::domain::ErrorCode::CollaboratorAlreadyExists`] when the
    /// address belongs to the owner or an existing collaborator.
    async fn add_collaborator(
        &self,
        list: ListId,
        actor: UserId,
        email: Email,
    ) -> Result<UserId, Error>;

    /// Remove a collaborator.
    async fn remove_collaborator(
        &self,
        list: ListId,
        actor: UserId,
        target: UserId,
    ) -> Result<(), Error>;

    /// Owner plus collaborators with their roles.
    async fn members(&self, list: ListId, viewer: UserId) -> Result<Vec<ListMember>, Error>;

    /// Add or re-role a member by user id.
    async fn add_member(
        &self,
        list: ListId,
        actor: UserId,
        target: UserId,
        role: CollaboratorRole,
    ) -> Result<Vec<ListMember>, Error>;

    /// One page of a discovery listing.
    async fn lists(&self, query: ListQuery, page: PageRequest)
    -> Result<Page<ListSummary>, Error>;
}
