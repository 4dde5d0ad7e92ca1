//! List management, membership, and discovery handlers.
//!
//! ```text
//! POST   /api/v1/lists {"name":"Lisbon","isPrivate":true}
//! GET    /api/v1/lists
//! GET    /api/v1/lists/public | /lists/recent | /lists/search?q=
//! GET    /api/v1/lists/{id}
//! PATCH  /api/v1/lists/{id} {"description":null}
//! DELETE /api/v1/lists/{id}
//! POST   /api/v1/lists/{id}/collaborators {"email":"bob@example.com"}
//! DELETE /api/v1/lists/{id}/collaborators/{user_id}
//! GET    /api/v1/lists/{id}/members
//! POST   /api/v1/lists/{id}/members {"userId":7,"role":"editor"}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use pagination::{Page, PageParams};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::domain::{
    CollaboratorRole, Email, Error, ListDescription, ListDetails, ListId, ListMember, ListName,
    ListQuery, ListSummary, ListUpdate, NewList, Patch, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ListSummaryPageSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::social::{SearchQuery, parse_search_term};
use crate::inbound::http::state::HttpState;
use crate::middleware::{Budget, RateLimit};
use crate::inbound::http::validation::{
    DEFAULT_PAGE_SIZE, FieldName, invalid_field, missing_field_error, page_request,
};

/// New list body.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateListRequest {
    #[schema(example = "Lisbon tascas")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
}

fn parse_description(raw: String) -> Result<ListDescription, Error> {
    ListDescription::new(raw).map_err(|err| invalid_field(FieldName::new("description"), err))
}

fn parse_name(raw: String) -> Result<ListName, Error> {
    ListName::new(raw).map_err(|err| invalid_field(FieldName::new("name"), err))
}

fn parse_new_list(owner_id: UserId, payload: CreateListRequest) -> Result<NewList, Error> {
    let name = payload
        .name
        .ok_or_else(|| missing_field_error(FieldName::new("name")))?;
    Ok(NewList {
        owner_id,
        name: parse_name(name)?,
        description: payload.description.map(parse_description).transpose()?,
        is_private: payload.is_private,
    })
}

/// Partial list update. `description: null` clears the description.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateListRequest {
    pub name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub description: Patch<String>,
    pub is_private: Option<bool>,
}

impl TryFrom<UpdateListRequest> for ListUpdate {
    type Error = Error;

    fn try_from(value: UpdateListRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: value.name.map(parse_name).transpose()?,
            description: value.description.try_map(parse_description)?,
            is_private: value.is_private,
        })
    }
}

/// Collaborator invitation body.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorRequest {
    #[schema(example = "bob@example.com")]
    pub email: Option<String>,
}

fn parse_email(payload: CollaboratorRequest) -> Result<Email, Error> {
    let field = FieldName::new("email");
    let raw = payload.email.ok_or_else(|| missing_field_error(field))?;
    Email::new(raw).map_err(|err| invalid_field(field, err))
}

/// Collaborator added to a list.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorResponse {
    /// The collaborator's user id; a placeholder account for unknown emails.
    #[schema(value_type = i64)]
    pub user_id: UserId,
}

/// Member grant body. `role` defaults to `viewer`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Option<i64>,
    #[serde(default)]
    pub role: CollaboratorRole,
}

async fn list_page(
    state: &HttpState,
    query: ListQuery,
    paging: PageParams,
) -> ApiResult<web::Json<Page<ListSummary>>> {
    let request = page_request(paging, DEFAULT_PAGE_SIZE)?;
    let page = state.lists.lists(query, request).await?;
    Ok(web::Json(page))
}

/// Create a list owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/lists",
    request_body = CreateListRequest,
    responses(
        (status = 201, description = "List created", body = ListDetails),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["lists"],
    operation_id = "createList"
)]
#[post("/lists", wrap = "RateLimit::new(Budget::CreateList)")]
pub async fn create_list(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateListRequest>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let list = parse_new_list(owner, payload.into_inner())?;
    let details = state.lists.create_list(list).await?;
    Ok(HttpResponse::Created().json(details))
}

/// Lists owned by the caller.
#[utoipa::path(
    get,
    path = "/api/v1/lists",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("pageSize" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses(
        (status = 200, description = "Owned lists", body = ListSummaryPageSchema),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["lists"],
    operation_id = "listOwnedLists"
)]
#[get("/lists", wrap = "RateLimit::new(Budget::OwnedLists)")]
pub async fn owned_lists(
    state: web::Data<HttpState>,
    session: SessionContext,
    paging: web::Query<PageParams>,
) -> ApiResult<web::Json<Page<ListSummary>>> {
    let owner = session.require_user_id()?;
    list_page(&state, ListQuery::Owned(owner), paging.into_inner()).await
}

/// Every public list, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/lists/public",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("pageSize" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses(
        (status = 200, description = "Public lists", body = ListSummaryPageSchema),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["lists"],
    operation_id = "listPublicLists",
    security([])
)]
#[get("/lists/public", wrap = "RateLimit::new(Budget::PublicLists)")]
pub async fn public_lists(
    state: web::Data<HttpState>,
    paging: web::Query<PageParams>,
) -> ApiResult<web::Json<Page<ListSummary>>> {
    list_page(&state, ListQuery::Public, paging.into_inner()).await
}

/// Public lists plus the caller's own, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/lists/recent",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("pageSize" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses(
        (status = 200, description = "Recent lists", body = ListSummaryPageSchema),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["lists"],
    operation_id = "listRecentLists"
)]
#[get("/lists/recent", wrap = "RateLimit::new(Budget::RecentLists)")]
pub async fn recent_lists(
    state: web::Data<HttpState>,
    session: SessionContext,
    paging: web::Query<PageParams>,
) -> ApiResult<web::Json<Page<ListSummary>>> {
    let viewer = session.require_user_id()?;
    list_page(&state, ListQuery::Recent(viewer), paging.into_inner()).await
}

/// Search list names and descriptions. Anonymous callers see public lists
/// only.
#[utoipa::path(
    get,
    path = "/api/v1/lists/search",
    params(
        ("q" = String, Query, description = "Search term"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("pageSize" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses(
        (status = 200, description = "Matching lists", body = ListSummaryPageSchema),
        (status = 400, description = "Missing or blank search term", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["lists"],
    operation_id = "searchLists",
    security([])
)]
#[get("/lists/search", wrap = "RateLimit::new(Budget::ListSearch)")]
pub async fn search_lists(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<SearchQuery>,
    paging: web::Query<PageParams>,
) -> ApiResult<web::Json<Page<ListSummary>>> {
    let viewer = session.user_id();
    let term = parse_search_term(query.into_inner())?;
    debug!(anonymous = viewer.is_none(), "list search");
    list_page(
        &state,
        ListQuery::Search { term, viewer },
        paging.into_inner(),
    )
    .await
}

/// List details and collaborator emails.
#[utoipa::path(
    get,
    path = "/api/v1/lists/{id}",
    params(("id" = i64, Path, description = "List id")),
    responses(
        (status = 200, description = "List details", body = ListDetails),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "No access to this list", body = Error),
        (status = 404, description = "List not found", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["lists"],
    operation_id = "getList"
)]
#[get("/lists/{id:\\d+}", wrap = "RateLimit::new(Budget::ListDetail)")]
pub async fn get_list(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<ListDetails>> {
    let viewer = session.require_user_id()?;
    let details = state
        .lists
        .get_list(ListId::new(path.into_inner()), viewer)
        .await?;
    Ok(web::Json(details))
}

/// Update list fields. Only the owner may edit.
#[utoipa::path(
    patch,
    path = "/api/v1/lists/{id}",
    params(("id" = i64, Path, description = "List id")),
    request_body = UpdateListRequest,
    responses(
        (status = 200, description = "Updated list", body = ListDetails),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "List not found", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["lists"],
    operation_id = "updateList"
)]
#[patch("/lists/{id:\\d+}", wrap = "RateLimit::new(Budget::UpdateList)")]
pub async fn update_list(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
    payload: web::Json<UpdateListRequest>,
) -> ApiResult<web::Json<ListDetails>> {
    let actor = session.require_user_id()?;
    let update = ListUpdate::try_from(payload.into_inner())?;
    let details = state
        .lists
        .update_list(ListId::new(path.into_inner()), actor, update)
        .await?;
    Ok(web::Json(details))
}

/// Delete a list with its places and memberships.
#[utoipa::path(
    delete,
    path = "/api/v1/lists/{id}",
    params(("id" = i64, Path, description = "List id")),
    responses(
        (status = 204, description = "List deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "List not found", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["lists"],
    operation_id = "deleteList"
)]
#[delete("/lists/{id:\\d+}", wrap = "RateLimit::new(Budget::DeleteList)")]
pub async fn delete_list(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    state
        .lists
        .delete_list(ListId::new(path.into_inner()), actor)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Invite a collaborator by email.
#[utoipa::path(
    post,
    path = "/api/v1/lists/{id}/collaborators",
    params(("id" = i64, Path, description = "List id")),
    request_body = CollaboratorRequest,
    responses(
        (status = 201, description = "Collaborator added", body = CollaboratorResponse),
        (status = 400, description = "Invalid email", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "List not found", body = Error),
        (status = 409, description = "Already the owner or a collaborator", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["lists"],
    operation_id = "addCollaborator"
)]
#[post("/lists/{id:\\d+}/collaborators", wrap = "RateLimit::new(Budget::AddCollaborator)")]
pub async fn add_collaborator(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
    payload: web::Json<CollaboratorRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let email = parse_email(payload.into_inner())?;
    let user_id = state
        .lists
        .add_collaborator(ListId::new(path.into_inner()), actor, email)
        .await?;
    Ok(HttpResponse::Created().json(CollaboratorResponse { user_id }))
}

/// Remove a collaborator.
#[utoipa::path(
    delete,
    path = "/api/v1/lists/{id}/collaborators/{user_id}",
    params(
        ("id" = i64, Path, description = "List id"),
        ("user_id" = i64, Path, description = "Collaborator's user id")
    ),
    responses(
        (status = 204, description = "Collaborator removed"),
        (status = 400, description = "Cannot remove the list owner", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "List, user, or membership not found", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["lists"],
    operation_id = "removeCollaborator"
)]
#[delete("/lists/{id:\\d+}/collaborators/{user_id:\\d+}", wrap = "RateLimit::new(Budget::RemoveCollaborator)")]
pub async fn remove_collaborator(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let (list, target) = path.into_inner();
    state
        .lists
        .remove_collaborator(ListId::new(list), actor, UserId::new(target))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Owner and collaborators with their roles.
#[utoipa::path(
    get,
    path = "/api/v1/lists/{id}/members",
    params(("id" = i64, Path, description = "List id")),
    responses(
        (status = 200, description = "Members", body = [ListMember]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "No access to this list", body = Error),
        (status = 404, description = "List not found", body = Error)
    ),
    tags = ["lists"],
    operation_id = "listMembers"
)]
#[get("/lists/{id:\\d+}/members")]
pub async fn members(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<Vec<ListMember>>> {
    let viewer = session.require_user_id()?;
    let members = state
        .lists
        .members(ListId::new(path.into_inner()), viewer)
        .await?;
    Ok(web::Json(members))
}

/// Grant or change a member's role by user id.
#[utoipa::path(
    post,
    path = "/api/v1/lists/{id}/members",
    params(("id" = i64, Path, description = "List id")),
    request_body = AddMemberRequest,
    responses(
        (status = 200, description = "Members after the change", body = [ListMember]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "List or user not found", body = Error),
        (status = 409, description = "The owner cannot be a member", body = Error)
    ),
    tags = ["lists"],
    operation_id = "addMember"
)]
#[post("/lists/{id:\\d+}/members")]
pub async fn add_member(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
    payload: web::Json<AddMemberRequest>,
) -> ApiResult<web::Json<Vec<ListMember>>> {
    let actor = session.require_user_id()?;
    let AddMemberRequest { user_id, role } = payload.into_inner();
    let target = user_id.ok_or_else(|| missing_field_error(FieldName::new("userId")))?;
    let updated_members = state
        .lists
        .add_member(ListId::new(path.into_inner()), actor, UserId::new(target), role)
        .await?;
    Ok(web::Json(updated_members))
}

#[cfg(test)]
mod tests;
