//! Scan submission endpoint.
//!
//! ```text
//! POST /api/v1/scans {"photoDataUri":"data:image/png;base64,..."}
//! ```
//!
//! The scan is stored only when the session carries an identity; a failed
//! save still returns the analysis with `persisted: false`.

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::domain::ports::SubmitScanRequest;
use crate::domain::ScanOutcome;
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::scan_error_to_http;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/scans`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Photo encoded as a `data:image/...;base64,` URI.
    #[schema(example = "data:image/png;base64,iVBORw0KGgo=")]
    pub photo_data_uri: String,
}

/// Analysis returned for a submitted photo.
#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    #[schema(example = "Steamed rice")]
    pub food_name: String,
    /// Free text, one fact per line.
    #[schema(example = "Calories: 200 kcal\nCarbohydrates: 45 g")]
    pub nutrition_information: String,
    /// Identifier of the stored scan, present when `persisted` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<String>,
    pub persisted: bool,
    /// Why the scan was not stored despite a signed-in identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
}

/// Analyse a food photo and store the result for the signed-in identity.
#[utoipa::path(
    post,
    path = "/api/v1/scans",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Photo analysed", body = ScanResponse),
        (status = 400, description = "Photo data missing", body = ErrorSchema),
        (status = 502, description = "Analysis failed or the photo could not be read", body = ErrorSchema)
    ),
    tags = ["scans"],
    operation_id = "submitScan"
)]
#[post("/scans")]
pub async fn submit_scan(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ScanRequest>,
) -> ApiResult<web::Json<ScanResponse>> {
    let identity = session.identity();
    debug!(signed_in = identity.is_some(), "scan submitted");
    let outcome = state
        .scans
        .submit_scan(SubmitScanRequest {
            photo_data_uri: payload.into_inner().photo_data_uri,
            identity,
        })
        .await;

    match outcome {
        ScanOutcome::Success {
            result,
            record_id,
            persistence_error,
        } => Ok(web::Json(ScanResponse {
            food_name: result.food_name().to_owned(),
            nutrition_information: result.nutrition_information().to_owned(),
            persisted: record_id.is_some(),
            scan_id: record_id.map(|id| id.to_string()),
            persistence_error: persistence_error.map(|error| error.to_string()),
        })),
        ScanOutcome::Failure(error) => Err(scan_error_to_http(&error)),
    }
}
