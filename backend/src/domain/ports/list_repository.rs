//! Port for list and membership persistence.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    AccessLevel, CollaboratorRole, ListId, ListMember, ListQuery, ListSummary, ListUpdate,
    NewList, PlaceList, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by list repository adapters.
    pub enum ListRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "list repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "list repository query failed: {message}",
        /// The `(list, user)` membership already exists.
        DuplicateMembership => "membership already exists",
        /// A referenced list or user row does not exist.
        MissingReference { message: String } => "referenced row missing: {message}",
    }
}

/// Port for list rows, membership rows, and list discovery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListRepository: Send + Sync {
    /// Insert a list and return the stored row.
    async fn insert(&self, list: &NewList) -> Result<PlaceList, ListRepositoryError>;

    /// Fetch a list by id.
    async fn find_by_id(&self, id: ListId) -> Result<Option<PlaceList>, ListRepositoryError>;

    /// Apply the supplied fields, bump `updated_at`, and return the row.
    async fn update(
        &self,
        id: ListId,
        update: &ListUpdate,
    ) -> Result<Option<PlaceList>, ListRepositoryError>;

    /// Delete a list together with its places and memberships.
    async fn delete(&self, id: ListId) -> Result<bool, ListRepositoryError>;

    /// Whether the list exists.
    async fn exists(&self, id: ListId) -> Result<bool, ListRepositoryError>;

    /// The caller's relationship to the list, resolved in one query.
    ///
    /// `None` covers both a missing list and a list the user cannot reach.
    async fn access_level(
        &self,
        list: ListId,
        user: UserId,
    ) -> Result<Option<AccessLevel>, ListRepositoryError>;

    /// Whether `user` owns `list`.
    async fn is_owner(&self, list: ListId, user: UserId) -> Result<bool, ListRepositoryError>;

    /// Emails of collaborators, owner excluded, ordered by email.
    async fn collaborator_emails(&self, list: ListId) -> Result<Vec<String>, ListRepositoryError>;

    /// Owner first, then collaborators ordered by email.
    async fn members(&self, list: ListId) -> Result<Vec<ListMember>, ListRepositoryError>;

    /// Whether a membership row exists.
    async fn membership_exists(
        &self,
        list: ListId,
        user: UserId,
    ) -> Result<bool, ListRepositoryError>;

    /// Insert a membership row.
    ///
    /// A concurrent duplicate surfaces as
    /// [`ListRepositoryError::DuplicateMembership`].
    async fn insert_membership(
        &self,
        list: ListId,
        user: UserId,
        role: CollaboratorRole,
    ) -> Result<(), ListRepositoryError>;

    /// Insert a membership row or overwrite the role of an existing one.
    async fn upsert_membership(
        &self,
        list: ListId,
        user: UserId,
        role: CollaboratorRole,
    ) -> Result<(), ListRepositoryError>;

    /// Delete a membership row. Returns whether one was removed.
    async fn delete_membership(
        &self,
        list: ListId,
        user: UserId,
    ) -> Result<bool, ListRepositoryError>;

    /// One page of a discovery query, newest first, with place counts.
    async fn page(
        &self,
        query: &ListQuery,
        request: PageRequest,
    ) -> Result<Page<ListSummary>, ListRepositoryError>;
}
