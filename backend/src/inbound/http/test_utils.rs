//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, test as actix_test, web};

use crate::domain::ports::{
    MockAccountCommand, MockIdentityCommand, MockListCommand, MockPlaceCommand,
    MockSocialCommand,
};
use crate::domain::{Error, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::middleware::RateLimits;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Driving-port mocks for one handler test. Unused ports keep their
/// expectation-free defaults, so any call to them fails the test.
#[derive(Default)]
pub struct TestPorts {
    pub identity: MockIdentityCommand,
    pub accounts: MockAccountCommand,
    pub lists: MockListCommand,
    pub places: MockPlaceCommand,
    pub social: MockSocialCommand,
}

impl TestPorts {
    fn into_state(self) -> HttpState {
        HttpState {
            identity: Arc::new(self.identity),
            accounts: Arc::new(self.accounts),
            lists: Arc::new(self.lists),
            places: Arc::new(self.places),
            social: Arc::new(self.social),
        }
    }

    /// App serving `configure`'s handlers under `/api/v1`, plus
    /// `GET /test/login/{id}` for seeding an authenticated session.
    ///
    /// Route budgets use the production allowances.
    pub fn app<F>(
        self,
        configure: F,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    >
    where
        F: FnOnce(&mut web::ServiceConfig),
    {
        App::new()
            .app_data(web::Data::new(self.into_state()))
            .app_data(web::Data::new(RateLimits::new()))
            .wrap(test_session_middleware())
            .route(
                "/test/login/{id}",
                web::get().to(|session: SessionContext, id: web::Path<i64>| async move {
                    session.log_in(UserId::new(id.into_inner()))?;
                    Ok::<_, Error>(HttpResponse::Ok().finish())
                }),
            )
            .service(web::scope("/api/v1").configure(configure))
    }
}

/// The `session` cookie set by a response, if any.
pub fn session_cookie(response: &ServiceResponse) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}

/// Authenticate as `user` against an app built by [`TestPorts::app`].
pub async fn login_as<S>(app: &S, user: i64) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = actix_test::call_service(
        app,
        actix_test::TestRequest::get()
            .uri(&format!("/test/login/{user}"))
            .to_request(),
    )
    .await;
    session_cookie(&response).expect("session cookie set")
}
