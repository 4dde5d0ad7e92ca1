//! Place handlers, always scoped to one list.
//!
//! ```text
//! GET    /api/v1/lists/{id}/places?page=1&pageSize=30
//! POST   /api/v1/lists/{id}/places {"placeId":"ChIJ...","name":"Tasca","address":"...",
//!                                   "latitude":38.71,"longitude":-9.14}
//! PATCH  /api/v1/lists/{id}/places/{place_id} {"notes":"ask for the sardines"}
//! DELETE /api/v1/lists/{id}/places/{place_id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use pagination::{Page, PageParams};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{
    Error, ListId, NewPlace, NewPlaceInput, Patch, Place, PlaceId, PlaceUpdate,
    PlaceValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::PlacePageSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::middleware::{Budget, RateLimit};
use crate::inbound::http::validation::{
    FieldName, PLACE_PAGE_SIZE, invalid_field, missing_field_error, page_request,
};

/// Place to save into a list.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPlaceRequest {
    /// External catalogue reference, unique within the list.
    #[schema(example = "ChIJd8BlQ2BZwokRAFUEcm_qrcA")]
    pub place_id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: Option<String>,
    pub notes: Option<String>,
    pub visit_status: Option<String>,
}

const fn field_for(error: &PlaceValidationError) -> FieldName {
    FieldName::new(match error {
        PlaceValidationError::EmptyExternalRef => "placeId",
        PlaceValidationError::InvalidName { .. } => "name",
        PlaceValidationError::AddressTooLong { .. } => "address",
        PlaceValidationError::NotesTooLong { .. } => "notes",
        PlaceValidationError::LatitudeOutOfRange(_) => "latitude",
        PlaceValidationError::LongitudeOutOfRange(_) => "longitude",
    })
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(FieldName::new(field)))
}

fn parse_new_place(payload: AddPlaceRequest) -> Result<NewPlace, Error> {
    let input = NewPlaceInput {
        external_ref: required(payload.place_id, "placeId")?,
        name: required(payload.name, "name")?,
        address: required(payload.address, "address")?,
        latitude: required(payload.latitude, "latitude")?,
        longitude: required(payload.longitude, "longitude")?,
        rating: payload.rating,
        notes: payload.notes,
        visit_status: payload.visit_status,
    };
    NewPlace::new(input).map_err(|err| invalid_field(field_for(&err), err))
}

/// Partial place update. Omitted fields are left alone; `null` clears.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePlaceRequest {
    #[schema(value_type = Option<String>)]
    pub notes: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub rating: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub visit_status: Patch<String>,
}

impl TryFrom<UpdatePlaceRequest> for PlaceUpdate {
    type Error = Error;

    fn try_from(value: UpdatePlaceRequest) -> Result<Self, Self::Error> {
        Self {
            notes: value.notes,
            rating: value.rating,
            visit_status: value.visit_status,
        }
        .validated()
        .map_err(|err| invalid_field(field_for(&err), err))
    }
}

/// Places saved in a list, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/lists/{id}/places",
    params(
        ("id" = i64, Path, description = "List id"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("pageSize" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses(
        (status = 200, description = "Places", body = PlacePageSchema),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "No access to this list", body = Error),
        (status = 404, description = "List not found", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["places"],
    operation_id = "listPlaces"
)]
#[get("/lists/{id:\\d+}/places", wrap = "RateLimit::new(Budget::ListPlaces)")]
pub async fn list_places(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
    paging: web::Query<PageParams>,
) -> ApiResult<web::Json<Page<Place>>> {
    let viewer = session.require_user_id()?;
    let request = page_request(paging.into_inner(), PLACE_PAGE_SIZE)?;
    let page = state
        .places
        .places(ListId::new(path.into_inner()), viewer, request)
        .await?;
    Ok(web::Json(page))
}

/// Save a place into a list.
#[utoipa::path(
    post,
    path = "/api/v1/lists/{id}/places",
    params(("id" = i64, Path, description = "List id")),
    request_body = AddPlaceRequest,
    responses(
        (status = 201, description = "Place saved", body = Place),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "No access to this list", body = Error),
        (status = 404, description = "List not found", body = Error),
        (status = 409, description = "Place already saved in this list", body = Error),
        (status = 422, description = "Rating or visit status rejected", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["places"],
    operation_id = "addPlace"
)]
#[post("/lists/{id:\\d+}/places", wrap = "RateLimit::new(Budget::AddPlace)")]
pub async fn add_place(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
    payload: web::Json<AddPlaceRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let place = parse_new_place(payload.into_inner())?;
    let saved = state
        .places
        .add_place(ListId::new(path.into_inner()), actor, place)
        .await?;
    Ok(HttpResponse::Created().json(saved))
}

/// Update notes, rating, or visit status.
#[utoipa::path(
    patch,
    path = "/api/v1/lists/{id}/places/{place_id}",
    params(
        ("id" = i64, Path, description = "List id"),
        ("place_id" = i64, Path, description = "Place id")
    ),
    request_body = UpdatePlaceRequest,
    responses(
        (status = 200, description = "Updated place", body = Place),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "No access to this list", body = Error),
        (status = 404, description = "Place not found in this list", body = Error),
        (status = 422, description = "Rating or visit status rejected", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["places"],
    operation_id = "updatePlace"
)]
#[patch("/lists/{id:\\d+}/places/{place_id:\\d+}", wrap = "RateLimit::new(Budget::UpdatePlace)")]
pub async fn update_place(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i64, i64)>,
    payload: web::Json<UpdatePlaceRequest>,
) -> ApiResult<web::Json<Place>> {
    let actor = session.require_user_id()?;
    let (list, place) = path.into_inner();
    let update = PlaceUpdate::try_from(payload.into_inner())?;
    let updated = state
        .places
        .update_place(ListId::new(list), PlaceId::new(place), actor, update)
        .await?;
    Ok(web::Json(updated))
}

/// Remove a place from a list.
#[utoipa::path(
    delete,
    path = "/api/v1/lists/{id}/places/{place_id}",
    params(
        ("id" = i64, Path, description = "List id"),
        ("place_id" = i64, Path, description = "Place id")
    ),
    responses(
        (status = 204, description = "Place removed"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "No access to this list", body = Error),
        (status = 404, description = "Place not found in this list", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["places"],
    operation_id = "deletePlace"
)]
#[delete("/lists/{id:\\d+}/places/{place_id:\\d+}", wrap = "RateLimit::new(Budget::DeletePlace)")]
pub async fn delete_place(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let (list, place) = path.into_inner();
    state
        .places
        .delete_place(ListId::new(list), PlaceId::new(place), actor)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockPlaceCommand;
    use crate::domain::{ErrorCode, UserId};
    use crate::inbound::http::test_utils::{TestPorts, login_as};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use actix_web::test::TestRequest;
    use mockall::predicate::eq;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    fn configure(cfg: &mut web::ServiceConfig) {
        cfg.service(list_places)
            .service(add_place)
            .service(update_place)
            .service(delete_place);
    }

    fn with_places(places: MockPlaceCommand) -> TestPorts {
        TestPorts {
            places,
            ..TestPorts::default()
        }
    }

    #[fixture]
    fn request() -> AddPlaceRequest {
        AddPlaceRequest {
            place_id: Some("X1".to_owned()),
            name: Some("Tasca".to_owned()),
            address: Some("Rua 1".to_owned()),
            latitude: Some(38.71),
            longitude: Some(-9.14),
            ..AddPlaceRequest::default()
        }
    }

    fn field(error: &Error) -> Option<&str> {
        error
            .details()
            .and_then(|details| details.get("field"))
            .and_then(Value::as_str)
    }

    #[rstest]
    fn missing_coordinates_name_the_field(mut request: AddPlaceRequest) {
        request.longitude = None;

        let error = parse_new_place(request).expect_err("missing longitude");

        assert_eq!(field(&error), Some("longitude"));
    }

    #[rstest]
    fn out_of_range_latitude_names_the_field(mut request: AddPlaceRequest) {
        request.latitude = Some(91.0);

        let error = parse_new_place(request).expect_err("bad latitude");

        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(field(&error), Some("latitude"));
    }

    #[rstest]
    fn notes_only_update_leaves_other_fields_unset() {
        let request: UpdatePlaceRequest =
            serde_json::from_value(json!({ "notes": "sardines" })).expect("valid body");

        let update = PlaceUpdate::try_from(request).expect("valid update");

        assert_eq!(update.notes, Patch::Value("sardines".to_owned()));
        assert_eq!(update.rating, Patch::Unset);
        assert_eq!(update.visit_status, Patch::Unset);
    }

    #[actix_web::test]
    async fn duplicate_place_is_a_conflict() {
        let mut places = MockPlaceCommand::new();
        places
            .expect_add_place()
            .return_once(|_, _, _| Err(Error::already_exists("Place already in list")));
        let app = actix_test::init_service(with_places(places).app(configure)).await;
        let cookie = login_as(&app, 1).await;

        let response = actix_test::call_service(
            &app,
            TestRequest::post()
                .uri("/api/v1/lists/2/places")
                .cookie(cookie)
                .set_json(json!({
                    "placeId": "X1",
                    "name": "Tasca",
                    "address": "Rua 1",
                    "latitude": 38.71,
                    "longitude": -9.14
                }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn rejected_rating_is_unprocessable() {
        let mut places = MockPlaceCommand::new();
        places
            .expect_update_place()
            .with(
                eq(ListId::new(2)),
                eq(PlaceId::new(5)),
                eq(UserId::new(1)),
                eq(PlaceUpdate {
                    rating: Patch::Value("great".to_owned()),
                    ..PlaceUpdate::default()
                }),
            )
            .return_once(|_, _, _, _| Err(Error::invalid_data("rating is not allowed")));
        let app = actix_test::init_service(with_places(places).app(configure)).await;
        let cookie = login_as(&app, 1).await;

        let response = actix_test::call_service(
            &app,
            TestRequest::patch()
                .uri("/api/v1/lists/2/places/5")
                .cookie(cookie)
                .set_json(json!({ "rating": "great" }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn place_from_another_list_is_not_found() {
        let mut places = MockPlaceCommand::new();
        places
            .expect_delete_place()
            .with(eq(ListId::new(2)), eq(PlaceId::new(5)), eq(UserId::new(1)))
            .return_once(|_, _, _| Err(Error::not_found("Place not found")));
        let app = actix_test::init_service(with_places(places).app(configure)).await;
        let cookie = login_as(&app, 1).await;

        let response = actix_test::call_service(
            &app,
            TestRequest::delete()
                .uri("/api/v1/lists/2/places/5")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
