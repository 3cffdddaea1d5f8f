//! OpenAPI document for the REST API.
//!
//! Registers every inbound path plus the schema mirrors from
//! [`crate::inbound::http::schemas`]. Swagger UI serves it at `/docs` in
//! debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::identity::IdentityResponse;
use crate::inbound::http::nutrition::{
    FoodItemRequest, NutritionSummaryRequest, NutritionSummaryResponse,
};
use crate::inbound::http::scans::{ScanRequest, ScanResponse};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::ws::messages::ScanView;

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
                "Session cookie issued by POST /api/v1/session/anonymous.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "NutriSnap backend API",
        description = "Food photo analysis, scan history and daily nutrition summaries."
    ),
    servers((url = "/", description = "Relative to the deployment base URL")),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::identity::sign_in_anonymous,
        crate::inbound::http::identity::current_identity,
        crate::inbound::http::identity::sign_out,
        crate::inbound::http::scans::submit_scan,
        crate::inbound::http::nutrition::summarize_nutrition,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::ws::history_feed,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        IdentityResponse,
        ScanRequest,
        ScanResponse,
        ScanView,
        FoodItemRequest,
        NutritionSummaryRequest,
        NutritionSummaryResponse,
    )),
    tags(
        (name = "session", description = "Anonymous identity bound to the session cookie"),
        (name = "scans", description = "Food photo analysis"),
        (name = "history", description = "Live scan history feed"),
        (name = "nutrition", description = "Daily intake summaries"),
        (name = "health", description = "Probes for orchestrators")
    )
)]
pub struct ApiDoc;
