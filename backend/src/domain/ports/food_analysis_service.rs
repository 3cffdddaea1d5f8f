//! Driven port for the multimodal model that identifies food in a photo.
//!
//! The domain hands over the encoded payload untouched; decoding the data URI
//! and talking to the model are adapter concerns.

use async_trait::async_trait;

use crate::domain::{AnalysisResult, ImagePayload};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced while analysing a photo.
    pub enum FoodAnalysisError {
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "food analysis transport failed: {message}",
        /// The model call exceeded its deadline.
        Timeout { message: String } =>
            "food analysis timed out: {message}",
        /// The model provider throttled the request.
        RateLimited { message: String } =>
            "food analysis rate limited: {message}",
        /// The response did not match the expected structure.
        Decode { message: String } =>
            "food analysis response decode failed: {message}",
        /// The payload could not be turned into a model request.
        InvalidRequest { message: String } =>
            "food analysis request invalid: {message}",
        /// The model refused or returned nothing usable.
        Rejected { message: String } =>
            "food analysis rejected: {message}",
    }
}

/// Port for identifying a food and describing its nutrition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FoodAnalysisService: Send + Sync {
    /// Analyse one photo.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use nutrisnap::domain::ImagePayload;
    /// use nutrisnap::domain::ports::{FixtureFoodAnalysisService, FoodAnalysisService};
    ///
    /// # async fn example() -> Result<(), nutrisnap::domain::ports::FoodAnalysisError> {
    /// let service = FixtureFoodAnalysisService;
    /// let image = ImagePayload::new("data:image/png;base64,AAAA").expect("payload");
    /// let result = service.analyze(&image).await?;
    /// assert!(!result.food_name().is_empty());
    /// # Ok(())
    /// # }
    /// ```
    async fn analyze(&self, image: &ImagePayload) -> Result<AnalysisResult, FoodAnalysisError>;
}

/// Fixture implementation that recognises every photo as the same meal.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureFoodAnalysisService;

/// Food name reported by [`FixtureFoodAnalysisService`].
pub const FIXTURE_FOOD_NAME: &str = "Steamed rice";

#[async_trait]
impl FoodAnalysisService for FixtureFoodAnalysisService {
    async fn analyze(&self, _image: &ImagePayload) -> Result<AnalysisResult, FoodAnalysisError> {
        AnalysisResult::new(FIXTURE_FOOD_NAME, "Calories: 200 kcal\nCarbohydrates: 45 g")
            .map_err(|err| FoodAnalysisError::decode(err.to_string()))
    }
}
