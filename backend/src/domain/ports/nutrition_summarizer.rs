//! Driven port for the text model that summarises a day's food intake.

use async_trait::async_trait;

use crate::domain::{FoodIntakeItem, NutritionSummary};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced while summarising food intake.
    pub enum NutritionSummarizerError {
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "nutrition summary transport failed: {message}",
        /// The model call exceeded its deadline.
        Timeout { message: String } =>
            "nutrition summary timed out: {message}",
        /// The model provider throttled the request.
        RateLimited { message: String } =>
            "nutrition summary rate limited: {message}",
        /// The response did not match the expected structure.
        Decode { message: String } =>
            "nutrition summary decode failed: {message}",
        /// The provider rejected the request as malformed.
        InvalidRequest { message: String } =>
            "nutrition summary request invalid: {message}",
    }
}

/// Port for producing a prose summary of a day's intake.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NutritionSummarizer: Send + Sync {
    /// Summarise the given items. Callers guarantee `items` is non-empty.
    async fn summarize(
        &self,
        items: &[FoodIntakeItem],
    ) -> Result<NutritionSummary, NutritionSummarizerError>;
}

/// Fixture implementation that echoes the total calorie count.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureNutritionSummarizer;

#[async_trait]
impl NutritionSummarizer for FixtureNutritionSummarizer {
    async fn summarize(
        &self,
        items: &[FoodIntakeItem],
    ) -> Result<NutritionSummary, NutritionSummarizerError> {
        let calories: f64 = items.iter().map(FoodIntakeItem::calories).sum();
        Ok(NutritionSummary::new(format!(
            "{} items, {calories:.0} kcal in total.",
            items.len()
        )))
    }
}
