//! Per-route request budgets.
//!
//! Each limited handler carries a [`RateLimit`] naming its [`Budget`]. The
//! counters live in a shared [`RateLimits`] registry registered as app data,
//! so every worker draws from the same allowance. Callers are keyed by their
//! session user when logged in and by client address otherwise.
//!
//! Routes without a registry in app data are not limited.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::task::{Context, Poll};

use actix_session::SessionExt;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, ResponseError, web};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::warn;

use crate::domain::Error as DomainError;
use crate::inbound::http::session::USER_ID_KEY;

/// Keyed state is pruned once a limiter tracks this many callers.
const PRUNE_THRESHOLD: usize = 10_000;

/// A named allowance shared by every caller of one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Budget {
    /// `PUT /users/me/username`.
    SetUsername,
    /// `GET /users/me/following`.
    Following,
    /// `GET /users/me/followers`.
    Followers,
    /// `GET /users/search`.
    UserSearch,
    /// `POST /users/{id}/follow`.
    Follow,
    /// `DELETE /users/{id}/follow`.
    Unfollow,
    /// `GET /notifications`.
    Notifications,
    /// `POST /lists`.
    CreateList,
    /// `GET /lists`.
    OwnedLists,
    /// `GET /lists/public`.
    PublicLists,
    /// `GET /lists/recent`.
    RecentLists,
    /// `GET /lists/search`.
    ListSearch,
    /// `GET /lists/{id}`.
    ListDetail,
    /// `PATCH /lists/{id}`.
    UpdateList,
    /// `DELETE /lists/{id}`.
    DeleteList,
    /// `POST /lists/{id}/collaborators`.
    AddCollaborator,
    /// `DELETE /lists/{id}/collaborators/{user_id}`.
    RemoveCollaborator,
    /// `GET /lists/{id}/places`.
    ListPlaces,
    /// `POST /lists/{id}/places`.
    AddPlace,
    /// `PATCH /lists/{id}/places/{place_id}`.
    UpdatePlace,
    /// `DELETE /lists/{id}/places/{place_id}`.
    DeletePlace,
}

impl Budget {
    /// Every budget, for building a registry.
    pub const ALL: [Self; 21] = [
        Self::SetUsername,
        Self::Following,
        Self::Followers,
        Self::UserSearch,
        Self::Follow,
        Self::Unfollow,
        Self::Notifications,
        Self::CreateList,
        Self::OwnedLists,
        Self::PublicLists,
        Self::RecentLists,
        Self::ListSearch,
        Self::ListDetail,
        Self::UpdateList,
        Self::DeleteList,
        Self::AddCollaborator,
        Self::RemoveCollaborator,
        Self::ListPlaces,
        Self::AddPlace,
        Self::UpdatePlace,
        Self::DeletePlace,
    ];

    /// Requests allowed per caller per minute.
    #[must_use]
    pub const fn per_minute(self) -> u32 {
        match self {
            Self::SetUsername => 2,
            Self::Followers | Self::Notifications | Self::CreateList => 5,
            Self::Following
            | Self::Follow
            | Self::Unfollow
            | Self::PublicLists
            | Self::RecentLists
            | Self::UpdateList
            | Self::DeleteList
            | Self::ListPlaces => 10,
            Self::OwnedLists | Self::ListSearch | Self::ListDetail => 15,
            Self::AddCollaborator
            | Self::RemoveCollaborator
            | Self::UpdatePlace
            | Self::DeletePlace => 20,
            Self::UserSearch => 30,
            Self::AddPlace => 40,
        }
    }
}

/// Process-wide counters, one keyed limiter per [`Budget`].
pub struct RateLimits {
    limiters: HashMap<Budget, DefaultKeyedRateLimiter<String>>,
}

impl RateLimits {
    /// Registry with the default allowance for every budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_quota(Budget::per_minute)
    }

    /// Registry whose allowances come from `per_minute`. A zero allowance
    /// leaves that budget unlimited.
    pub fn with_quota(per_minute: impl Fn(Budget) -> u32) -> Self {
        let limiters = Budget::ALL
            .into_iter()
            .filter_map(|budget| {
                NonZeroU32::new(per_minute(budget))
                    .map(|allowance| (budget, RateLimiter::keyed(Quota::per_minute(allowance))))
            })
            .collect();
        Self { limiters }
    }

    /// Spend one request from `caller`'s allowance under `budget`.
    ///
    /// Returns `false` once the allowance is exhausted.
    pub fn try_acquire(&self, budget: Budget, caller: &str) -> bool {
        let Some(limiter) = self.limiters.get(&budget) else {
            return true;
        };
        if limiter.len() > PRUNE_THRESHOLD {
            limiter.retain_recent();
        }
        limiter.check_key(&caller.to_owned()).is_ok()
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self::new()
    }
}

fn caller_key(req: &ServiceRequest) -> String {
    if let Ok(Some(user)) = req.get_session().get::<i64>(USER_ID_KEY) {
        return format!("user:{user}");
    }
    let info = req.connection_info();
    format!("addr:{}", info.realip_remote_addr().unwrap_or("unknown"))
}

/// Resource middleware charging each request to a [`Budget`].
///
/// # Examples
/// ```
/// use actix_web::{App, HttpResponse, web};
/// use placelists::middleware::{Budget, RateLimit, RateLimits};
///
/// let app = App::new()
///     .app_data(web::Data::new(RateLimits::new()))
///     .service(
///         web::resource("/lists")
///             .wrap(RateLimit::new(Budget::CreateList))
///             .route(web::post().to(|| async { HttpResponse::Created() })),
///     );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    budget: Budget,
}

impl RateLimit {
    /// Charge requests to `budget`.
    #[must_use]
    pub const fn new(budget: Budget) -> Self {
        Self { budget }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            budget: self.budget,
        }))
    }
}

/// Service wrapper produced by [`RateLimit`].
pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    budget: Budget,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let budget = self.budget;
        Box::pin(async move {
            let allowed = req
                .app_data::<web::Data<RateLimits>>()
                .is_none_or(|limits| limits.try_acquire(budget, &caller_key(&req)));
            if !allowed {
                warn!(?budget, "rate limit exceeded");
                let error = DomainError::too_many_requests("Rate limit exceeded; try again later");
                return Ok(req.into_response(error.error_response().map_into_right_body()));
            }
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TRACE_ID_HEADER, UserId};
    use crate::inbound::http::session::SessionContext;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
    use crate::middleware::Trace;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case(Budget::SetUsername, 2)]
    #[case(Budget::Followers, 5)]
    #[case(Budget::ListPlaces, 10)]
    #[case(Budget::UserSearch, 30)]
    #[case(Budget::AddPlace, 40)]
    fn allowance_is_exhausted_after_quota(#[case] budget: Budget, #[case] quota: u32) {
        let limits = RateLimits::new();
        for _ in 0..quota {
            assert!(limits.try_acquire(budget, "addr:10.0.0.1"));
        }
        assert!(!limits.try_acquire(budget, "addr:10.0.0.1"));
    }

    #[rstest]
    fn callers_and_budgets_are_independent() {
        let limits = RateLimits::new();
        assert!(limits.try_acquire(Budget::SetUsername, "user:1"));
        assert!(limits.try_acquire(Budget::SetUsername, "user:1"));
        assert!(!limits.try_acquire(Budget::SetUsername, "user:1"));

        assert!(limits.try_acquire(Budget::SetUsername, "user:2"));
        assert!(limits.try_acquire(Budget::Follow, "user:1"));
    }

    #[rstest]
    fn zero_allowance_is_unlimited() {
        let limits = RateLimits::with_quota(|_| 0);
        for _ in 0..100 {
            assert!(limits.try_acquire(Budget::SetUsername, "user:1"));
        }
    }

    #[actix_web::test]
    async fn exhausted_budget_answers_429_with_error_body() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(RateLimits::new()))
                .wrap(Trace)
                .service(
                    web::resource("/lists")
                        .wrap(RateLimit::new(Budget::CreateList))
                        .route(web::post().to(|| async { HttpResponse::Created() })),
                ),
        )
        .await;

        for _ in 0..Budget::CreateList.per_minute() {
            let res =
                actix_test::call_service(&app, actix_test::TestRequest::post().uri("/lists").to_request())
                    .await;
            assert_eq!(res.status(), StatusCode::CREATED);
        }

        let res =
            actix_test::call_service(&app, actix_test::TestRequest::post().uri("/lists").to_request()).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        let header = res
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["code"], "too_many_requests");
        assert_eq!(body["traceId"].as_str(), header.as_deref());
    }

    #[actix_web::test]
    async fn logged_in_callers_do_not_share_an_address_budget() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(RateLimits::new()))
                .wrap(test_session_middleware())
                .route(
                    "/login/{id}",
                    web::post().to(|session: SessionContext, id: web::Path<i64>| async move {
                        session.log_in(UserId::new(id.into_inner()))?;
                        Ok::<_, DomainError>(HttpResponse::Ok().finish())
                    }),
                )
                .service(
                    web::resource("/username")
                        .wrap(RateLimit::new(Budget::SetUsername))
                        .route(web::put().to(|| async { HttpResponse::Ok() })),
                ),
        )
        .await;

        let mut cookies = Vec::new();
        for user in [1, 2] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri(&format!("/login/{user}"))
                    .to_request(),
            )
            .await;
            cookies.push(session_cookie(&res).expect("session cookie"));
        }

        for cookie in &cookies {
            for _ in 0..Budget::SetUsername.per_minute() {
                let res = actix_test::call_service(
                    &app,
                    actix_test::TestRequest::put()
                        .uri("/username")
                        .cookie(cookie.clone())
                        .to_request(),
                )
                .await;
                assert_eq!(res.status(), StatusCode::OK);
            }
        }
    }

    #[actix_web::test]
    async fn routes_pass_through_without_a_registry() {
        let app = actix_test::init_service(
            App::new().service(
                web::resource("/lists")
                    .wrap(RateLimit::new(Budget::CreateList))
                    .route(web::post().to(|| async { HttpResponse::Created() })),
            ),
        )
        .await;

        for _ in 0..=Budget::CreateList.per_minute() {
            let res =
                actix_test::call_service(&app, actix_test::TestRequest::post().uri("/lists").to_request())
                    .await;
            assert_eq!(res.status(), StatusCode::CREATED);
        }
    }
}
