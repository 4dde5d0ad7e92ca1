//! Follow graph, user discovery, and notification handlers.
//!
//! ```text
//! POST   /api/v1/users/{id}/follow
//! DELETE /api/v1/users/{id}/follow
//! GET    /api/v1/users/me/following?page=1&pageSize=20
//! GET    /api/v1/users/me/followers
//! GET    /api/v1/users/search?q=ada
//! GET    /api/v1/notifications
//! ```

use actix_web::{delete, get, post, web};
use pagination::{Page, PageParams};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Error, FollowOutcome, Notification, SearchTerm, UserFollowInfo, UserId, UserListing,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{NotificationPageSchema, UserFollowInfoPageSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::middleware::{Budget, RateLimit};
use crate::inbound::http::validation::{
    DEFAULT_PAGE_SIZE, FieldName, invalid_field, missing_field_error, page_request,
};

/// Result of an unfollow request.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnfollowResponse {
    /// False when the caller was not following the user.
    pub unfollowed: bool,
}

/// Search query string.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Substring matched against email and username.
    pub q: Option<String>,
}

pub(crate) fn parse_search_term(query: SearchQuery) -> Result<SearchTerm, Error> {
    let field = FieldName::new("q");
    let raw = query.q.ok_or_else(|| missing_field_error(field))?;
    SearchTerm::new(raw).map_err(|err| invalid_field(field, err))
}

async fn user_page(
    state: &HttpState,
    listing: UserListing,
    paging: PageParams,
) -> ApiResult<web::Json<Page<UserFollowInfo>>> {
    let request = page_request(paging, DEFAULT_PAGE_SIZE)?;
    let page = state.social.users(listing, request).await?;
    Ok(web::Json(page))
}

/// Follow a user. Following someone twice is not an error.
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/follow",
    params(("id" = i64, Path, description = "User to follow")),
    responses(
        (status = 200, description = "Following", body = FollowOutcome),
        (status = 400, description = "Cannot follow yourself", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["social"],
    operation_id = "followUser"
)]
#[post("/users/{id:\\d+}/follow", wrap = "RateLimit::new(Budget::Follow)")]
pub async fn follow_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<FollowOutcome>> {
    let follower = session.require_user_id()?;
    let outcome = state
        .social
        .follow(follower, UserId::new(path.into_inner()))
        .await?;
    Ok(web::Json(outcome))
}

/// Stop following a user.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}/follow",
    params(("id" = i64, Path, description = "User to unfollow")),
    responses(
        (status = 200, description = "Unfollow outcome", body = UnfollowResponse),
        (status = 400, description = "Cannot unfollow yourself", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["social"],
    operation_id = "unfollowUser"
)]
#[delete("/users/{id:\\d+}/follow", wrap = "RateLimit::new(Budget::Unfollow)")]
pub async fn unfollow_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<UnfollowResponse>> {
    let follower = session.require_user_id()?;
    let unfollowed = state
        .social
        .unfollow(follower, UserId::new(path.into_inner()))
        .await?;
    Ok(web::Json(UnfollowResponse { unfollowed }))
}

/// Users the caller follows.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/following",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("pageSize" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses(
        (status = 200, description = "Followed users", body = UserFollowInfoPageSchema),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["social"],
    operation_id = "listFollowing"
)]
#[get("/users/me/following", wrap = "RateLimit::new(Budget::Following)")]
pub async fn following(
    state: web::Data<HttpState>,
    session: SessionContext,
    paging: web::Query<PageParams>,
) -> ApiResult<web::Json<Page<UserFollowInfo>>> {
    let user = session.require_user_id()?;
    user_page(&state, UserListing::Following(user), paging.into_inner()).await
}

/// Users following the caller, flagged with follow-back status.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/followers",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("pageSize" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses(
        (status = 200, description = "Followers", body = UserFollowInfoPageSchema),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["social"],
    operation_id = "listFollowers"
)]
#[get("/users/me/followers", wrap = "RateLimit::new(Budget::Followers)")]
pub async fn followers(
    state: web::Data<HttpState>,
    session: SessionContext,
    paging: web::Query<PageParams>,
) -> ApiResult<web::Json<Page<UserFollowInfo>>> {
    let user = session.require_user_id()?;
    user_page(&state, UserListing::Followers(user), paging.into_inner()).await
}

/// Search users by email or username.
#[utoipa::path(
    get,
    path = "/api/v1/users/search",
    params(
        ("q" = String, Query, description = "Search term"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("pageSize" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses(
        (status = 200, description = "Matching users", body = UserFollowInfoPageSchema),
        (status = 400, description = "Missing or blank search term", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["social"],
    operation_id = "searchUsers"
)]
#[get("/users/search", wrap = "RateLimit::new(Budget::UserSearch)")]
pub async fn search_users(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<SearchQuery>,
    paging: web::Query<PageParams>,
) -> ApiResult<web::Json<Page<UserFollowInfo>>> {
    let viewer = session.require_user_id()?;
    let term = parse_search_term(query.into_inner())?;
    user_page(
        &state,
        UserListing::Search { term, viewer },
        paging.into_inner(),
    )
    .await
}

/// The caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("pageSize" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses(
        (status = 200, description = "Notifications", body = NotificationPageSchema),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 429, description = "Rate limit exceeded", body = Error)
    ),
    tags = ["social"],
    operation_id = "listNotifications"
)]
#[get("/notifications", wrap = "RateLimit::new(Budget::Notifications)")]
pub async fn notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
    paging: web::Query<PageParams>,
) -> ApiResult<web::Json<Page<Notification>>> {
    let user = session.require_user_id()?;
    let request = page_request(paging.into_inner(), DEFAULT_PAGE_SIZE)?;
    let page = state.social.notifications(user, request).await?;
    Ok(web::Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockSocialCommand;
    use crate::inbound::http::test_utils::{TestPorts, login_as};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use actix_web::test::TestRequest;
    use mockall::predicate::{always, eq};
    use pagination::PageRequest;
    use serde_json::Value;

    fn configure(cfg: &mut web::ServiceConfig) {
        cfg.service(follow_user)
            .service(unfollow_user)
            .service(following)
            .service(followers)
            .service(search_users)
            .service(notifications);
    }

    fn with_social(social: MockSocialCommand) -> TestPorts {
        TestPorts {
            social,
            ..TestPorts::default()
        }
    }

    #[actix_web::test]
    async fn repeated_follow_reports_existing_edge() {
        let mut social = MockSocialCommand::new();
        social
            .expect_follow()
            .with(eq(UserId::new(1)), eq(UserId::new(2)))
            .return_once(|_, _| {
                Ok(FollowOutcome {
                    already_following: true,
                })
            });
        let app = actix_test::init_service(with_social(social).app(configure)).await;
        let cookie = login_as(&app, 1).await;

        let response = actix_test::call_service(
            &app,
            TestRequest::post()
                .uri("/api/v1/users/2/follow")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["alreadyFollowing"], true);
    }

    #[actix_web::test]
    async fn self_follow_is_a_bad_request() {
        let mut social = MockSocialCommand::new();
        social
            .expect_follow()
            .return_once(|_, _| Err(Error::invalid_request("You cannot follow yourself")));
        let app = actix_test::init_service(with_social(social).app(configure)).await;
        let cookie = login_as(&app, 1).await;

        let response = actix_test::call_service(
            &app,
            TestRequest::post()
                .uri("/api/v1/users/1/follow")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn followers_page_uses_requested_paging() {
        let expected = PageRequest::new(2, 5).expect("valid request");
        let mut social = MockSocialCommand::new();
        social
            .expect_users()
            .with(eq(UserListing::Followers(UserId::new(1))), eq(expected))
            .return_once(|_, request| Ok(Page::new(Vec::new(), request, 7)));
        let app = actix_test::init_service(with_social(social).app(configure)).await;
        let cookie = login_as(&app, 1).await;

        let response = actix_test::call_service(
            &app,
            TestRequest::get()
                .uri("/api/v1/users/me/followers?page=2&pageSize=5")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["totalItems"], 7);
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["pageSize"], 5);
    }

    #[actix_web::test]
    async fn search_without_term_never_reaches_the_service() {
        let mut social = MockSocialCommand::new();
        social.expect_users().with(always(), always()).times(0);
        let app = actix_test::init_service(with_social(social).app(configure)).await;
        let cookie = login_as(&app, 1).await;

        let response = actix_test::call_service(
            &app,
            TestRequest::get()
                .uri("/api/v1/users/search?q=%20")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn oversized_page_is_rejected() {
        let app = actix_test::init_service(TestPorts::default().app(configure)).await;
        let cookie = login_as(&app, 1).await;

        let response = actix_test::call_service(
            &app,
            TestRequest::get()
                .uri("/api/v1/notifications?pageSize=500")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
