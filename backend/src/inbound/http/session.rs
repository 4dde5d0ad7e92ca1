//! Login state carried in the cookie session.
//!
//! The cookie holds a single value: the internal id of the signed-in user.
//! Logging in rotates the cookie, logging out clears it, and a cookie that
//! points at an account which no longer exists is dropped on first use.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::{info, warn};

use crate::domain::{Error, ErrorCode, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

/// Request-scoped view of the caller's login state.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Start a session for `user_id`.
    ///
    /// The cookie is renewed so that a session fixed before login cannot be
    /// reused afterwards.
    pub fn log_in(&self, user_id: UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.get())
            .map_err(|error| Error::internal(format!("failed to write session: {error}")))
    }

    /// The signed-in user, if any.
    ///
    /// An undecodable payload is removed from the session and reads as
    /// anonymous.
    pub fn user_id(&self) -> Option<UserId> {
        match self.0.get::<i64>(USER_ID_KEY) {
            Ok(id) => id.map(UserId::new),
            Err(error) => {
                warn!(%error, "discarding malformed session payload");
                self.0.remove(USER_ID_KEY);
                None
            }
        }
    }

    /// The signed-in user, or `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Forget the signed-in user and clear the cookie.
    pub fn log_out(&self) {
        self.0.purge();
    }

    /// Treat `NotFound` for the caller's own account as an expired session.
    ///
    /// The account may have been deleted from another device while this
    /// cookie was still live.
    pub fn expire_if_gone<T>(&self, result: Result<T, Error>) -> Result<T, Error> {
        match result {
            Err(error) if error.code() == ErrorCode::NotFound => {
                info!(user_id = ?self.user_id(), "session user no longer exists");
                self.log_out();
                Err(Error::unauthorized("session expired"))
            }
            other => other,
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = Session::from_request(req, payload);
        Box::pin(async move { session.await.map(Self) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
    use actix_web::cookie::Cookie;
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    async fn whoami(session: SessionContext) -> Result<HttpResponse, Error> {
        let user = session.require_user_id()?;
        Ok(HttpResponse::Ok().body(user.to_string()))
    }

    async fn log_in(session: SessionContext, id: web::Path<i64>) -> Result<HttpResponse, Error> {
        session.log_in(UserId::new(id.into_inner()))?;
        Ok(HttpResponse::Ok().finish())
    }

    async fn log_out(session: SessionContext) -> HttpResponse {
        session.log_out();
        HttpResponse::NoContent().finish()
    }

    async fn deleted_account(session: SessionContext) -> Result<HttpResponse, Error> {
        session.require_user_id()?;
        session.expire_if_gone::<()>(Err(Error::not_found("User not found")))?;
        Ok(HttpResponse::Ok().finish())
    }

    async fn forbidden_account(session: SessionContext) -> Result<HttpResponse, Error> {
        session.expire_if_gone::<()>(Err(Error::forbidden("This profile is private")))?;
        Ok(HttpResponse::Ok().finish())
    }

    async fn garbage(session: actix_session::Session) -> Result<HttpResponse, Error> {
        session
            .insert(USER_ID_KEY, "seven")
            .map_err(|error| Error::internal(error.to_string()))?;
        Ok(HttpResponse::Ok().finish())
    }

    async fn app() -> impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse,
        Error = actix_web::Error,
    > {
        test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route("/login/{id}", web::post().to(log_in))
                .route("/logout", web::post().to(log_out))
                .route("/whoami", web::get().to(whoami))
                .route("/gone", web::get().to(deleted_account))
                .route("/private", web::get().to(forbidden_account))
                .route("/garbage", web::post().to(garbage)),
        )
        .await
    }

    async fn call(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
        request: test::TestRequest,
        cookie: Option<&Cookie<'static>>,
    ) -> ServiceResponse {
        let request = match cookie {
            Some(cookie) => request.cookie(cookie.clone()),
            None => request,
        };
        test::call_service(app, request.to_request()).await
    }

    #[actix_web::test]
    async fn login_rotates_cookie_to_new_user() {
        let app = app().await;
        let first = call(&app, test::TestRequest::post().uri("/login/3"), None).await;
        let first_cookie = session_cookie(&first).expect("first cookie");

        let second = call(
            &app,
            test::TestRequest::post().uri("/login/9"),
            Some(&first_cookie),
        )
        .await;
        let second_cookie = session_cookie(&second).expect("renewed cookie");
        assert_ne!(first_cookie.value(), second_cookie.value());

        let me = call(
            &app,
            test::TestRequest::get().uri("/whoami"),
            Some(&second_cookie),
        )
        .await;
        assert_eq!(me.status(), StatusCode::OK);
        assert_eq!(test::read_body(me).await, "9");
    }

    #[actix_web::test]
    async fn logout_clears_cookie() {
        let app = app().await;
        let login = call(&app, test::TestRequest::post().uri("/login/3"), None).await;
        let cookie = session_cookie(&login).expect("session cookie");

        let logout = call(&app, test::TestRequest::post().uri("/logout"), Some(&cookie)).await;
        assert_eq!(logout.status(), StatusCode::NO_CONTENT);
        let cleared = session_cookie(&logout).expect("removal cookie");
        assert!(cleared.value().is_empty());

        let me = call(&app, test::TestRequest::get().uri("/whoami"), Some(&cleared)).await;
        assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn deleted_account_expires_session() {
        let app = app().await;
        let login = call(&app, test::TestRequest::post().uri("/login/5"), None).await;
        let cookie = session_cookie(&login).expect("session cookie");

        let gone = call(&app, test::TestRequest::get().uri("/gone"), Some(&cookie)).await;
        assert_eq!(gone.status(), StatusCode::UNAUTHORIZED);
        let cleared = session_cookie(&gone).expect("removal cookie");
        assert!(cleared.value().is_empty());
    }

    #[actix_web::test]
    async fn other_failures_keep_session() {
        let app = app().await;
        let login = call(&app, test::TestRequest::post().uri("/login/5"), None).await;
        let cookie = session_cookie(&login).expect("session cookie");

        let private = call(&app, test::TestRequest::get().uri("/private"), Some(&cookie)).await;
        assert_eq!(private.status(), StatusCode::FORBIDDEN);
        assert!(session_cookie(&private).is_none());
    }

    #[rstest]
    #[case::no_cookie(false)]
    #[case::malformed_payload(true)]
    #[actix_web::test]
    async fn anonymous_callers_are_unauthorised(#[case] malformed: bool) {
        let app = app().await;
        let cookie = if malformed {
            let seeded = call(&app, test::TestRequest::post().uri("/garbage"), None).await;
            session_cookie(&seeded)
        } else {
            None
        };

        let me = call(&app, test::TestRequest::get().uri("/whoami"), cookie.as_ref()).await;
        assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
    }
}
