//! Account self-service handlers.
//!
//! ```text
//! GET    /api/v1/users/me
//! PATCH  /api/v1/users/me {"displayName":"Ada","profilePictureUrl":null}
//! DELETE /api/v1/users/me
//! PUT    /api/v1/users/me/username {"username":"ada"}
//! GET    /api/v1/users/me/settings
//! PATCH  /api/v1/users/me/settings {"profileIsPublic":false}
//! GET    /api/v1/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, put, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{
    DisplayName, Error, Patch, PrivacySettings, PrivacySettingsUpdate, ProfileUpdate, User,
    UserId, Username,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::middleware::{Budget, RateLimit};
use crate::inbound::http::validation::{FieldName, invalid_field, missing_field_error};

/// Partial profile update. Omitted fields are left alone; `null` clears.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileRequest {
    #[schema(value_type = Option<String>, example = "Ada Lovelace")]
    pub display_name: Patch<String>,
    #[schema(value_type = Option<String>)]
    pub profile_picture_url: Patch<String>,
}

impl TryFrom<ProfileRequest> for ProfileUpdate {
    type Error = Error;

    fn try_from(value: ProfileRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            display_name: value
                .display_name
                .try_map(DisplayName::new)
                .map_err(|err| invalid_field(FieldName::new("displayName"), err))?,
            profile_picture_url: value.profile_picture_url,
        })
    }
}

/// Username claim body.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsernameRequest {
    #[schema(example = "ada_l")]
    pub username: Option<String>,
}

fn parse_username(payload: UsernameRequest) -> Result<Username, Error> {
    let field = FieldName::new("username");
    let raw = payload.username.ok_or_else(|| missing_field_error(field))?;
    Username::new(raw).map_err(|err| invalid_field(field, err))
}

/// Partial privacy update. `null` restores a flag's default.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivacyRequest {
    #[schema(value_type = Option<bool>)]
    pub profile_is_public: Patch<bool>,
    #[schema(value_type = Option<bool>)]
    pub lists_are_public: Patch<bool>,
    #[schema(value_type = Option<bool>)]
    pub allow_analytics: Patch<bool>,
}

impl From<PrivacyRequest> for PrivacySettingsUpdate {
    fn from(value: PrivacyRequest) -> Self {
        Self {
            profile_is_public: value.profile_is_public,
            lists_are_public: value.lists_are_public,
            allow_analytics: value.allow_analytics,
        }
    }
}

/// The caller's profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not logged in, or the account is gone", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<User>> {
    let user_id = session.require_user_id()?;
    let user = session.expire_if_gone(state.accounts.profile(user_id).await)?;
    Ok(web::Json(user))
}

/// Update display name or profile picture.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateCurrentUser"
)]
#[patch("/users/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ProfileRequest>,
) -> ApiResult<web::Json<User>> {
    let user_id = session.require_user_id()?;
    let update = ProfileUpdate::try_from(payload.into_inner())?;
    let user = session.expire_if_gone(state.accounts.update_profile(user_id, update).await)?;
    Ok(web::Json(user))
}

/// Delete the caller's account and everything it owns.
#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Not logged in, or the account is gone", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteCurrentUser"
)]
#[delete("/users/me")]
pub async fn delete_current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    session.expire_if_gone(state.accounts.delete_account(user_id).await)?;
    session.log_out();
    Ok(HttpResponse::NoContent().finish())
}

/// Claim a username.
#[utoipa::path(
    put,
    path = "/api/v1/users/me/username",
    request_body = UsernameRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid username", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Username already taken", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["users"],
    operation_id = "setUsername"
)]
#[put("/users/me/username", wrap = "RateLimit::new(Budget::SetUsername)")]
pub async fn set_username(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<UsernameRequest>,
) -> ApiResult<web::Json<User>> {
    let user_id = session.require_user_id()?;
    let username = parse_username(payload.into_inner())?;
    let user = session.expire_if_gone(state.accounts.set_username(user_id, username).await)?;
    Ok(web::Json(user))
}

/// The caller's privacy flags.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/settings",
    responses(
        (status = 200, description = "Privacy settings", body = PrivacySettings),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "getPrivacySettings"
)]
#[get("/users/me/settings")]
pub async fn get_settings(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<PrivacySettings>> {
    let user_id = session.require_user_id()?;
    let settings = session.expire_if_gone(state.accounts.privacy_settings(user_id).await)?;
    Ok(web::Json(settings))
}

/// Update the caller's privacy flags.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me/settings",
    request_body = PrivacyRequest,
    responses(
        (status = 200, description = "Privacy settings", body = PrivacySettings),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "updatePrivacySettings"
)]
#[patch("/users/me/settings")]
pub async fn update_settings(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<PrivacyRequest>,
) -> ApiResult<web::Json<PrivacySettings>> {
    let user_id = session.require_user_id()?;
    let update = payload.into_inner().into();
    let settings =
        session.expire_if_gone(state.accounts.update_privacy_settings(user_id, update).await)?;
    Ok(web::Json(settings))
}

/// Another user's profile, subject to their privacy settings.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = User),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "This profile is private", body = Error),
        (status = 404, description = "User not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id:\\d+}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<User>> {
    let viewer = session.require_user_id()?;
    let user = state
        .accounts
        .view_profile(viewer, UserId::new(path.into_inner()))
        .await?;
    Ok(web::Json(user))
}

#[cfg(test)]
mod tests;
