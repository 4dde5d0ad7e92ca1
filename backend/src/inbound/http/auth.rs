//! Session endpoints and verified-identity extraction.
//!
//! ```text
//! POST   /api/v1/session   resolve the gateway identity and log in
//! DELETE /api/v1/session   log out
//! ```
//!
//! Credentials are checked upstream. The gateway forwards the verified
//! identity as `X-Verified-*` headers, which only the login endpoint reads;
//! every other endpoint trusts the session cookie alone.

use actix_web::http::header::HeaderMap;
use actix_web::{HttpRequest, HttpResponse, delete, post, web};
use tracing::{info, warn};

use crate::domain::{Error, ResolvedUser, VerifiedIdentity};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Header carrying the verifier's stable subject id.
pub const VERIFIED_UID_HEADER: &str = "x-verified-uid";
/// Header carrying the verified email address.
pub const VERIFIED_EMAIL_HEADER: &str = "x-verified-email";
/// Header carrying the verified display name.
pub const VERIFIED_NAME_HEADER: &str = "x-verified-name";
/// Header carrying the verified profile picture URL.
pub const VERIFIED_PICTURE_HEADER: &str = "x-verified-picture";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?;
    match value.to_str() {
        Ok(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Err(error) => {
            warn!(header = name, %error, "ignoring non-ASCII identity header");
            None
        }
    }
}

/// Collect the identity asserted by the gateway. Absent or blank headers
/// become `None`; the resolver decides which fields are mandatory.
pub(crate) fn identity_from_headers(headers: &HeaderMap) -> VerifiedIdentity {
    VerifiedIdentity {
        uid: header_value(headers, VERIFIED_UID_HEADER),
        email: header_value(headers, VERIFIED_EMAIL_HEADER),
        name: header_value(headers, VERIFIED_NAME_HEADER),
        picture: header_value(headers, VERIFIED_PICTURE_HEADER),
    }
}

/// Resolve the verified identity to an account and start a session.
#[utoipa::path(
    post,
    path = "/api/v1/session",
    params(
        ("X-Verified-Uid" = String, Header, description = "Verifier subject id"),
        ("X-Verified-Email" = String, Header, description = "Verified email address"),
        ("X-Verified-Name" = Option<String>, Header, description = "Display name"),
        ("X-Verified-Picture" = Option<String>, Header, description = "Profile picture URL")
    ),
    responses(
        (status = 200, description = "Logged in", body = ResolvedUser,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Identity incomplete or malformed", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["session"],
    operation_id = "login",
    security([])
)]
#[post("/session")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
) -> ApiResult<web::Json<ResolvedUser>> {
    let identity = identity_from_headers(request.headers());
    let resolved = state.identity.resolve_or_create(identity).await?;
    session.log_in(resolved.user_id)?;
    info!(user_id = %resolved.user_id, "session established");
    Ok(web::Json(resolved))
}

/// End the current session.
#[utoipa::path(
    delete,
    path = "/api/v1/session",
    responses((status = 204, description = "Logged out")),
    tags = ["session"],
    operation_id = "logout",
    security([])
)]
#[delete("/session")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.log_out();
    HttpResponse::NoContent().finish()
}
