//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every handler in the inbound HTTP layer, the
//! request and response bodies they exchange, and the session cookie
//! security scheme. Swagger UI serves it in debug builds.

use crate::domain::{
    CollaboratorRole, Error, ErrorCode, FollowOutcome, ListDetails, ListMember, ListSummary,
    Notification, Place, PrivacySettings, ResolvedUser, User, UserFollowInfo,
};
use crate::inbound::http::lists::{
    AddMemberRequest, CollaboratorRequest, CollaboratorResponse, CreateListRequest,
    UpdateListRequest,
};
use crate::inbound::http::places::{AddPlaceRequest, UpdatePlaceRequest};
use crate::inbound::http::schemas::{
    ListSummaryPageSchema, NotificationPageSchema, PlacePageSchema, UserFollowInfoPageSchema,
};
use crate::inbound::http::social::UnfollowResponse;
use crate::inbound::http::users::{PrivacyRequest, ProfileRequest, UsernameRequest};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/session.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Placelists backend API",
        description = "Shared place lists with collaborators, follows, and notifications."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_current_user,
        crate::inbound::http::users::delete_current_user,
        crate::inbound::http::users::set_username,
        crate::inbound::http::users::get_settings,
        crate::inbound::http::users::update_settings,
        crate::inbound::http::users::get_user,
        crate::inbound::http::social::follow_user,
        crate::inbound::http::social::unfollow_user,
        crate::inbound::http::social::following,
        crate::inbound::http::social::followers,
        crate::inbound::http::social::search_users,
        crate::inbound::http::social::notifications,
        crate::inbound::http::lists::create_list,
        crate::inbound::http::lists::owned_lists,
        crate::inbound::http::lists::public_lists,
        crate::inbound::http::lists::recent_lists,
        crate::inbound::http::lists::search_lists,
        crate::inbound::http::lists::get_list,
        crate::inbound::http::lists::update_list,
        crate::inbound::http::lists::delete_list,
        crate::inbound::http::lists::add_collaborator,
        crate::inbound::http::lists::remove_collaborator,
        crate::inbound::http::lists::members,
        crate::inbound::http::lists::add_member,
        crate::inbound::http::places::list_places,
        crate::inbound::http::places::add_place,
        crate::inbound::http::places::update_place,
        crate::inbound::http::places::delete_place,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        ResolvedUser,
        PrivacySettings,
        ProfileRequest,
        UsernameRequest,
        PrivacyRequest,
        UserFollowInfo,
        FollowOutcome,
        UnfollowResponse,
        Notification,
        ListSummary,
        ListDetails,
        ListMember,
        CollaboratorRole,
        CreateListRequest,
        UpdateListRequest,
        CollaboratorRequest,
        CollaboratorResponse,
        AddMemberRequest,
        Place,
        AddPlaceRequest,
        UpdatePlaceRequest,
        ListSummaryPageSchema,
        PlacePageSchema,
        UserFollowInfoPageSchema,
        NotificationPageSchema,
    )),
    tags(
        (name = "session", description = "Login and logout"),
        (name = "users", description = "Profiles, usernames, and privacy settings"),
        (name = "social", description = "Follows, user search, and notifications"),
        (name = "lists", description = "Lists, discovery, and collaborators"),
        (name = "places", description = "Places saved in a list"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
