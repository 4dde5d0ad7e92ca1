//! Port for places stored inside lists.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{ListId, NewPlace, Place, PlaceId, PlaceUpdate};

use super::define_port_error;

define_port_error! {
    /// Errors raised by place repository adapters.
    pub enum PlaceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "place repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "place repository query failed: {message}",
        /// The place is already saved in the list.
        Duplicate => "place already in list",
        /// A check constraint rejected a value, usually rating or visit status.
        CheckViolation { constraint: String } => "check constraint {constraint} violated",
        /// The list was deleted underneath the write.
        ListMissing => "list no longer exists",
    }
}

/// Port for place rows, always addressed through their list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaceRepository: Send + Sync {
    /// Insert a place into a list.
    async fn insert(&self, list: ListId, place: &NewPlace) -> Result<Place, PlaceRepositoryError>;

    /// Fetch a place only if it belongs to `list`.
    async fn find_in_list(
        &self,
        place: PlaceId,
        list: ListId,
    ) -> Result<Option<Place>, PlaceRepositoryError>;

    /// Update a place only if it belongs to `list`.
    async fn update_in_list(
        &self,
        place: PlaceId,
        list: ListId,
        update: &PlaceUpdate,
    ) -> Result<Option<Place>, PlaceRepositoryError>;

    /// Delete a place only if it belongs to `list`.
    async fn delete_in_list(&self, place: PlaceId, list: ListId)
    -> Result<bool, PlaceRepositoryError>;

    /// One page of a list's places, newest first.
    async fn page_for_list(
        &self,
        list: ListId,
        request: PageRequest,
    ) -> Result<Page<Place>, PlaceRepositoryError>;
}
