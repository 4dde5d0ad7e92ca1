//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_http_state;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use placelists::Trace;
use placelists::middleware::RateLimits;
#[cfg(debug_assertions)]
use placelists::doc::ApiDoc;
use placelists::inbound::http::health::{HealthState, live, ready};
use placelists::inbound::http::state::HttpState;
use placelists::inbound::http::{auth, lists, places, social, users};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    rate_limits: Option<web::Data<RateLimits>>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

/// Register every `/api/v1` handler. Literal paths precede their `{id}`
/// siblings.
fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(auth::logout)
        .service(users::current_user)
        .service(users::update_current_user)
        .service(users::delete_current_user)
        .service(users::set_username)
        .service(users::get_settings)
        .service(users::update_settings)
        .service(social::following)
        .service(social::followers)
        .service(social::search_users)
        .service(users::get_user)
        .service(social::follow_user)
        .service(social::unfollow_user)
        .service(social::notifications)
        .service(lists::create_list)
        .service(lists::owned_lists)
        .service(lists::public_lists)
        .service(lists::recent_lists)
        .service(lists::search_lists)
        .service(lists::get_list)
        .service(lists::update_list)
        .service(lists::delete_list)
        .service(lists::add_collaborator)
        .service(lists::remove_collaborator)
        .service(lists::members)
        .service(lists::add_member)
        .service(places::list_places)
        .service(places::add_place)
        .service(places::update_place)
        .service(places::delete_place);
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        rate_limits,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let mut api = web::scope("/api/v1");
    if let Some(rate_limits) = rate_limits {
        api = api.app_data(rate_limits);
    }
    let api = api.wrap(session).configure(api_routes);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server over the configured pool.
///
/// The health state is marked ready once the listener is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config.db_pool);
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        rate_limits,
        db_pool: _,
    } = config;
    let rate_limits = rate_limits.then(|| web::Data::new(RateLimits::new()));

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            rate_limits: rate_limits.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
