//! Driving port for daily nutrition summaries.

use async_trait::async_trait;

use crate::domain::{Error, FoodIntakeItem, NutritionSummary};

/// Driving port that summarises a day's food intake.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DailyNutritionCommand: Send + Sync {
    /// Validate the items and return a prose summary.
    ///
    /// Returns [`crate::domain::ErrorCode::InvalidRequest`] for an empty list
    /// or invalid quantities.
    async fn summarize(&self, items: Vec<FoodIntakeItem>) -> Result<NutritionSummary, Error>;
}
