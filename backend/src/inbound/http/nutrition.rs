//! Daily nutrition summary endpoint.
//!
//! ```text
//! POST /api/v1/nutrition/summary {"foodItems":[{"name":"Dal","calories":180,...}]}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, FoodIntakeDraft, FoodIntakeItem};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::food_item_error;

/// One item eaten during the day.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FoodItemRequest {
    #[schema(example = "Dal")]
    pub name: String,
    #[schema(example = 180.0)]
    pub calories: f64,
    #[serde(alias = "protein")]
    #[schema(example = 9.0)]
    pub protein_g: f64,
    #[serde(alias = "fat")]
    #[schema(example = 3.0)]
    pub fat_g: f64,
    #[serde(alias = "carbohydrates")]
    #[schema(example = 30.0)]
    pub carbohydrates_g: f64,
    #[serde(default, alias = "vitamin_c")]
    pub vitamin_c_mg: Option<f64>,
}

impl From<FoodItemRequest> for FoodIntakeDraft {
    fn from(value: FoodItemRequest) -> Self {
        Self {
            name: value.name,
            calories: value.calories,
            protein_g: value.protein_g,
            fat_g: value.fat_g,
            carbohydrates_g: value.carbohydrates_g,
            vitamin_c_mg: value.vitamin_c_mg,
        }
    }
}

/// Request body for `POST /api/v1/nutrition/summary`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NutritionSummaryRequest {
    pub food_items: Vec<FoodItemRequest>,
}

/// Prose summary of the day's intake.
#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
pub struct NutritionSummaryResponse {
    #[schema(example = "Protein intake is low; add legumes or eggs.")]
    pub summary: String,
}

/// Summarise a day's food intake.
#[utoipa::path(
    post,
    path = "/api/v1/nutrition/summary",
    request_body = NutritionSummaryRequest,
    responses(
        (status = 200, description = "Summary", body = NutritionSummaryResponse),
        (status = 400, description = "Empty list or invalid quantities", body = ErrorSchema),
        (status = 502, description = "Summariser answered with a failure", body = ErrorSchema),
        (status = 503, description = "Summariser unreachable", body = ErrorSchema)
    ),
    tags = ["nutrition"],
    operation_id = "summarizeNutrition",
    security([])
)]
#[post("/nutrition/summary")]
pub async fn summarize_nutrition(
    state: web::Data<HttpState>,
    payload: web::Json<NutritionSummaryRequest>,
) -> ApiResult<web::Json<NutritionSummaryResponse>> {
    let items = payload
        .into_inner()
        .food_items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            FoodIntakeItem::new(item.into()).map_err(|error| food_item_error(index, &error))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let summary = state.nutrition.summarize(items).await?;
    Ok(web::Json(NutritionSummaryResponse {
        summary: summary.summary().to_owned(),
    }))
}
