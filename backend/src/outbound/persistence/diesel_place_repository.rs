//! PostgreSQL-backed `PlaceRepository` implementation.
//!
//! Every read and write filters on both the place id and the list id, so a
//! place from another list is indistinguishable from a missing one.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};
use tracing::debug;

use crate::domain::ports::{PlaceRepository, PlaceRepositoryError};
use crate::domain::{ListId, NewPlace, Patch, Place, PlaceId, PlaceUpdate};

use super::diesel_helpers::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::{NewPlaceRow, PlaceChangeset, PlaceRow};
use super::pool::{DbPool, PoolError};
use super::schema::places;

const PLACE_KEY: &str = "places_list_id_place_id_key";

/// Diesel-backed implementation of the `PlaceRepository` port.
#[derive(Clone)]
pub struct DieselPlaceRepository {
    pool: DbPool,
}

impl DieselPlaceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PlaceRepositoryError {
    PlaceRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> PlaceRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => PlaceRepositoryError::connection(message),
        DieselFailure::UniqueViolation { constraint }
            if constraint.as_deref() == Some(PLACE_KEY) =>
        {
            PlaceRepositoryError::duplicate()
        }
        DieselFailure::CheckViolation { constraint } => PlaceRepositoryError::check_violation(
            constraint.unwrap_or_else(|| "unknown".to_owned()),
        ),
        DieselFailure::ForeignKeyViolation { .. } => PlaceRepositoryError::list_missing(),
        other => PlaceRepositoryError::query(other.into_message()),
    }
}

fn row_to_place(row: PlaceRow) -> Place {
    Place {
        id: PlaceId::new(row.id),
        list_id: ListId::new(row.list_id),
        place_id: row.place_id,
        name: row.name,
        address: row.address,
        latitude: row.latitude,
        longitude: row.longitude,
        rating: row.rating,
        notes: row.notes,
        visit_status: row.visit_status,
        created_at: row.created_at,
    }
}

fn column(patch: &Patch<String>) -> Option<Option<&str>> {
    patch.as_change().map(|value| value.map(String::as_str))
}

fn place_changeset(update: &PlaceUpdate) -> PlaceChangeset<'_> {
    PlaceChangeset {
        notes: column(&update.notes),
        rating: column(&update.rating),
        visit_status: column(&update.visit_status),
    }
}

#[async_trait]
impl PlaceRepository for DieselPlaceRepository {
    async fn insert(&self, list: ListId, place: &NewPlace) -> Result<Place, PlaceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewPlaceRow {
            list_id: list.get(),
            place_id: &place.external_ref,
            name: &place.name,
            address: &place.address,
            latitude: place.coordinates.latitude(),
            longitude: place.coordinates.longitude(),
            rating: place.rating.as_deref(),
            notes: place.notes.as_deref(),
            visit_status: place.visit_status.as_deref(),
        };

        let stored: PlaceRow = diesel::insert_into(places::table)
            .values(&row)
            .returning(PlaceRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        debug!(list_id = %list, place_id = stored.id, "place inserted");
        Ok(row_to_place(stored))
    }

    async fn find_in_list(
        &self,
        place: PlaceId,
        list: ListId,
    ) -> Result<Option<Place>, PlaceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PlaceRow> = places::table
            .filter(places::id.eq(place.get()))
            .filter(places::list_id.eq(list.get()))
            .select(PlaceRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_place))
    }

    async fn update_in_list(
        &self,
        place: PlaceId,
        list: ListId,
        update: &PlaceUpdate,
    ) -> Result<Option<Place>, PlaceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = place_changeset(update);

        let row: Option<PlaceRow> = diesel::update(
            places::table
                .filter(places::id.eq(place.get()))
                .filter(places::list_id.eq(list.get())),
        )
        .set((&changes, places::updated_at.eq(diesel::dsl::now)))
        .returning(PlaceRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        Ok(row.map(row_to_place))
    }

    async fn delete_in_list(
        &self,
        place: PlaceId,
        list: ListId,
    ) -> Result<bool, PlaceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(
            places::table
                .filter(places::id.eq(place.get()))
                .filter(places::list_id.eq(list.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(deleted == 1)
    }

    async fn page_for_list(
        &self,
        list: ListId,
        request: PageRequest,
    ) -> Result<Page<Place>, PlaceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = places::table
            .filter(places::list_id.eq(list.get()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if total == 0 {
            return Ok(Page::empty(request));
        }

        let rows: Vec<PlaceRow> = places::table
            .filter(places::list_id.eq(list.get()))
            .select(PlaceRow::as_select())
            .order((places::created_at.desc(), places::id.desc()))
            .limit(request.limit())
            .offset(request.offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(Page::new(
            rows.into_iter().map(row_to_place).collect(),
            request,
            u64::try_from(total).unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let error = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(error, PlaceRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn notes_only_changeset_leaves_rating_untouched() {
        let update = PlaceUpdate {
            notes: Patch::Value("grilled sardines".to_owned()),
            ..PlaceUpdate::default()
        };

        let changes = place_changeset(&update);

        assert_eq!(changes.notes, Some(Some("grilled sardines")));
        assert_eq!(changes.rating, None);
        assert_eq!(changes.visit_status, None);
    }

    #[rstest]
    fn null_clears_column() {
        let update = PlaceUpdate {
            visit_status: Patch::Null,
            ..PlaceUpdate::default()
        };

        assert_eq!(place_changeset(&update).visit_status, Some(None));
    }
}
