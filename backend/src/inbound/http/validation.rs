//! Request validation helpers shared by HTTP handlers.

use actix_web::web;
use serde_json::json;
use tracing::debug;

use crate::domain::{Error, FoodIntakeValidationError};

/// JSON extractor settings turning malformed bodies into domain errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|error, _req| {
        debug!(error = %error, "rejected malformed JSON body");
        Error::invalid_request(format!("invalid JSON body: {error}"))
            .with_details(json!({ "code": "invalid_json" }))
            .into()
    })
}

/// Error for the food item at `index` that failed validation.
pub(crate) fn food_item_error(index: usize, error: &FoodIntakeValidationError) -> Error {
    let (field, code) = match error {
        FoodIntakeValidationError::EmptyName => ("name", "empty_name"),
        FoodIntakeValidationError::InvalidQuantity { field } => (*field, "invalid_quantity"),
    };
    Error::invalid_request(error.to_string()).with_details(json!({
        "index": index,
        "field": field,
        "code": code,
    }))
}
