//! WebSocket inbound adapter pushing scan history to clients.
//!
//! The upgrade requires an identity in the cookie session; the connection then
//! receives the identity's complete history on every change.

use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use tracing::{error, info};

use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;

pub mod messages;
mod session;
pub mod state;

/// Upgrade to the live history feed for the signed-in identity.
#[utoipa::path(
    get,
    path = "/api/v1/ws/history",
    responses(
        (status = 101, description = "Switching to the history feed"),
        (status = 401, description = "No identity in session", body = ErrorSchema)
    ),
    tags = ["history"],
    operation_id = "historyFeed"
)]
#[get("/ws/history")]
pub async fn history_feed(
    state: web::Data<state::WsState>,
    session: SessionContext,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let identity = session.require_identity()?;

    let (response, ws_session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "history feed upgrade failed");
        error
    })?;

    let feed = session::HistoryFeed::open(&state.synchronizer(), &identity);
    info!(user_id = %identity.id(), "history feed connected");
    actix_web::rt::spawn(session::run_history_session(feed, ws_session, messages));
    Ok(response)
}
