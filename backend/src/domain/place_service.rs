//! Places nested under lists.
//!
//! Every operation is scoped by list: a place id that belongs to another
//! list behaves exactly like a missing place.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use serde_json::json;
use tracing::debug;

use crate::domain::access::LIST_NOT_FOUND;
use crate::domain::ports::{ListRepository, PlaceCommand, PlaceRepository, PlaceRepositoryError};
use crate::domain::{
    AccessEvaluator, Error, ListId, NewPlace, Place, PlaceId, PlaceUpdate, UserId,
};

const PLACE_NOT_FOUND: &str = "Place not found in this list";

/// Place service implementing [`PlaceCommand`].
pub struct PlaceService<P, L> {
    places: Arc<P>,
    access: AccessEvaluator<L>,
}

impl<P, L> PlaceService<P, L>
where
    P: PlaceRepository,
    L: ListRepository,
{
    /// Create a new service. `lists` is only read for access checks.
    pub fn new(places: Arc<P>, lists: Arc<L>) -> Self {
        Self {
            places,
            access: AccessEvaluator::new(lists),
        }
    }

    fn map_place_error(error: PlaceRepositoryError) -> Error {
        match error {
            PlaceRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("place repository unavailable: {message}"))
            }
            PlaceRepositoryError::Query { message } => {
                Error::storage(format!("place repository error: {message}"))
            }
            PlaceRepositoryError::Duplicate => {
                Error::already_exists("Place already exists in this list")
            }
            PlaceRepositoryError::CheckViolation { constraint } => {
                Error::invalid_data(format!("Invalid data provided for place: {constraint}"))
                    .with_details(json!({ "constraint": constraint }))
            }
            PlaceRepositoryError::ListMissing => Error::not_found(LIST_NOT_FOUND),
        }
    }
}

#[async_trait]
impl<P, L> PlaceCommand for PlaceService<P, L>
where
    P: PlaceRepository,
    L: ListRepository,
{
    async fn places(
        &self,
        list: ListId,
        viewer: UserId,
        page: PageRequest,
    ) -> Result<Page<Place>, Error> {
        self.access.check_access(list, viewer).await?;
        self.places
            .page_for_list(list, page)
            .await
            .map_err(Self::map_place_error)
    }

    async fn add_place(
        &self,
        list: ListId,
        actor: UserId,
        place: NewPlace,
    ) -> Result<Place, Error> {
        self.access.check_access(list, actor).await?;
        let stored = self
            .places
            .insert(list, &place)
            .await
            .map_err(Self::map_place_error)?;
        debug!(list_id = %list, place_id = %stored.id, "place added");
        Ok(stored)
    }

    async fn update_place(
        &self,
        list: ListId,
        place: PlaceId,
        actor: UserId,
        update: PlaceUpdate,
    ) -> Result<Place, Error> {
        self.access.check_access(list, actor).await?;
        let row = if update.is_empty() {
            self.places.find_in_list(place, list).await
        } else {
            self.places.update_in_list(place, list, &update).await
        };
        row.map_err(Self::map_place_error)?
            .ok_or_else(|| Error::not_found(PLACE_NOT_FOUND))
    }

    async fn delete_place(
        &self,
        list: ListId,
        place: PlaceId,
        actor: UserId,
    ) -> Result<(), Error> {
        self.access.check_access(list, actor).await?;
        let deleted = self
            .places
            .delete_in_list(place, list)
            .await
            .map_err(Self::map_place_error)?;
        if deleted {
            Ok(())
        } else {
            Err(Error::not_found(PLACE_NOT_FOUND))
        }
    }
}
