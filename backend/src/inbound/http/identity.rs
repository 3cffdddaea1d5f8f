//! Anonymous session endpoints.
//!
//! ```text
//! POST   /api/v1/session/anonymous
//! GET    /api/v1/session
//! DELETE /api/v1/session
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::Identity;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;

/// Identity attached to the caller's session.
#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    #[schema(example = "9b2f6c1e4d3a4f5b8a7c6d5e4f3a2b1c")]
    pub id: String,
    pub is_anonymous: bool,
}

impl From<&Identity> for IdentityResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id().to_string(),
            is_anonymous: identity.is_anonymous(),
        }
    }
}

/// Sign in anonymously. Repeating the call keeps the existing identity.
#[utoipa::path(
    post,
    path = "/api/v1/session/anonymous",
    responses(
        (status = 200, description = "Signed in", body = IdentityResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["session"],
    operation_id = "signInAnonymous",
    security([])
)]
#[post("/session/anonymous")]
pub async fn sign_in_anonymous(session: SessionContext) -> ApiResult<web::Json<IdentityResponse>> {
    if let Some(identity) = session.identity() {
        return Ok(web::Json(IdentityResponse::from(&identity)));
    }
    let identity = Identity::issue_anonymous();
    session.remember(&identity)?;
    info!(user_id = %identity.id(), "issued anonymous identity");
    Ok(web::Json(IdentityResponse::from(&identity)))
}

/// Identity of the current session.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    responses(
        (status = 200, description = "Current identity", body = IdentityResponse),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["session"],
    operation_id = "currentIdentity"
)]
#[get("/session")]
pub async fn current_identity(session: SessionContext) -> ApiResult<web::Json<IdentityResponse>> {
    let identity = session.require_identity()?;
    Ok(web::Json(IdentityResponse::from(&identity)))
}

/// Sign out and expire the session cookie.
#[utoipa::path(
    delete,
    path = "/api/v1/session",
    responses((status = 204, description = "Signed out")),
    tags = ["session"],
    operation_id = "signOut",
    security([])
)]
#[delete("/session")]
pub async fn sign_out(session: SessionContext) -> HttpResponse {
    if let Some(identity) = session.identity() {
        info!(user_id = %identity.id(), "signed out");
    }
    session.forget();
    HttpResponse::NoContent().finish()
}
