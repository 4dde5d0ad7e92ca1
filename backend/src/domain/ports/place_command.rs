//! Driving port for places inside lists.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{Error, ListId, NewPlace, Place, PlaceId, PlaceUpdate, UserId};

/// Driving port for places. Every operation requires access to the list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaceCommand: Send + Sync {
    /// One page of the list's places.
    async fn places(
        &self,
        list: ListId,
        viewer: UserId,
        page: PageRequest,
    ) -> Result<Page<Place>, Error>;

    /// Save a place into the list.
    ///
    /// # Errors
    ///
    /// - [`crate::domain::ErrorCode::AlreadyExists`] when the external
    ///   reference is already saved in this list.
    /// - [`crate::domain::ErrorCode::InvalidData`] when storage rejects a
    ///   rating or visit status.
    async fn add_place(&self, list: ListId, actor: UserId, place: NewPlace)
    -> Result<Place, Error>;

    /// Apply a partial update to a place in the list.
    async fn update_place(
        &self,
        list: ListId,
        place: PlaceId,
        actor: UserId,
        update: PlaceUpdate,
    ) -> Result<Place, Error>;

    /// Remove a place from the list.
    async fn delete_place(&self, list: ListId, place: PlaceId, actor: UserId)
    -> Result<(), Error>;
}
