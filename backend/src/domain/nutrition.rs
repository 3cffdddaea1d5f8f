//! Daily nutrition summary: validated intake items and the service that asks
//! the summariser for prose insights.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Error;
use super::ports::{DailyNutritionCommand, NutritionSummarizer, NutritionSummarizerError};

/// Validation errors raised by [`FoodIntakeItem::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FoodIntakeValidationError {
    /// The item had no name.
    #[error("food item name must not be empty")]
    EmptyName,
    /// A quantity was negative or not a finite number.
    #[error("{field} must be a finite, non-negative number")]
    InvalidQuantity { field: &'static str },
}

/// One item eaten during the day with its nutrient quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodIntakeItem {
    name: String,
    calories: f64,
    protein_g: f64,
    fat_g: f64,
    carbohydrates_g: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vitamin_c_mg: Option<f64>,
}

/// Unvalidated quantities used to build a [`FoodIntakeItem`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FoodIntakeDraft {
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbohydrates_g: f64,
    pub vitamin_c_mg: Option<f64>,
}

fn check_quantity(field: &'static str, value: f64) -> Result<f64, FoodIntakeValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(FoodIntakeValidationError::InvalidQuantity { field })
    }
}

impl FoodIntakeItem {
    /// Validate a draft.
    ///
    /// # Examples
    /// ```
    /// use nutrisnap::domain::{FoodIntakeDraft, FoodIntakeItem};
    ///
    /// let item = FoodIntakeItem::new(FoodIntakeDraft {
    ///     name: "Dal".into(),
    ///     calories: 180.0,
    ///     protein_g: 9.0,
    ///     ..FoodIntakeDraft::default()
    /// })
    /// .expect("valid item");
    /// assert_eq!(item.name(), "Dal");
    /// ```
    pub fn new(draft: FoodIntakeDraft) -> Result<Self, FoodIntakeValidationError> {
        let name = draft.name.trim().to_owned();
        if name.is_empty() {
            return Err(FoodIntakeValidationError::EmptyName);
        }
        Ok(Self {
            name,
            calories: check_quantity("calories", draft.calories)?,
            protein_g: check_quantity("protein", draft.protein_g)?,
            fat_g: check_quantity("fat", draft.fat_g)?,
            carbohydrates_g: check_quantity("carbohydrates", draft.carbohydrates_g)?,
            vitamin_c_mg: draft
                .vitamin_c_mg
                .map(|value| check_quantity("vitamin C", value))
                .transpose()?,
        })
    }

    /// Re-run validation, e.g. after deserialising from an untrusted source.
    pub fn validate(&self) -> Result<(), FoodIntakeValidationError> {
        Self::new(FoodIntakeDraft {
            name: self.name.clone(),
            calories: self.calories,
            protein_g: self.protein_g,
            fat_g: self.fat_g,
            carbohydrates_g: self.carbohydrates_g,
            vitamin_c_mg: self.vitamin_c_mg,
        })
        .map(|_| ())
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn calories(&self) -> f64 {
        self.calories
    }

    pub fn protein_g(&self) -> f64 {
        self.protein_g
    }

    pub fn fat_g(&self) -> f64 {
        self.fat_g
    }

    pub fn carbohydrates_g(&self) -> f64 {
        self.carbohydrates_g
    }

    pub fn vitamin_c_mg(&self) -> Option<f64> {
        self.vitamin_c_mg
    }
}

/// Prose summary highlighting imbalances and areas for improvement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionSummary {
    summary: String,
}

impl NutritionSummary {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
        }
    }

    pub fn summary(&self) -> &str {
        self.summary.as_str()
    }
}

/// Summarises a day's intake through a [`NutritionSummarizer`].
pub struct DailyNutritionService<S: ?Sized> {
    summarizer: Arc<S>,
}

impl<S: ?Sized> Clone for DailyNutritionService<S> {
    fn clone(&self) -> Self {
        Self {
            summarizer: Arc::clone(&self.summarizer),
        }
    }
}

impl<S: ?Sized> DailyNutritionService<S> {
    pub fn new(summarizer: Arc<S>) -> Self {
        Self { summarizer }
    }
}

fn map_summarizer_error(error: NutritionSummarizerError) -> Error {
    match error {
        NutritionSummarizerError::Transport { .. } | NutritionSummarizerError::Timeout { .. } => {
            Error::service_unavailable(error.to_string())
        }
        NutritionSummarizerError::RateLimited { .. }
        | NutritionSummarizerError::Decode { .. }
        | NutritionSummarizerError::InvalidRequest { .. } => {
            Error::upstream_failure(error.to_string())
        }
    }
}

#[async_trait]
impl<S> DailyNutritionCommand for DailyNutritionService<S>
where
    S: NutritionSummarizer + ?Sized,
{
    async fn summarize(&self, items: Vec<FoodIntakeItem>) -> Result<NutritionSummary, Error> {
        if items.is_empty() {
            return Err(Error::invalid_request("at least one food item is required"));
        }
        for (index, item) in items.iter().enumerate() {
            item.validate().map_err(|err| {
                Error::invalid_request(err.to_string())
                    .with_details(serde_json::json!({ "index": index }))
            })?;
        }

        let summary = self.summarizer.summarize(&items).await.map_err(|err| {
            warn!(error = %err, items = items.len(), "nutrition summary failed");
            map_summarizer_error(err)
        })?;

        if summary.summary().trim().is_empty() {
            return Err(Error::upstream_failure("nutrition summary was empty"));
        }
        Ok(summary)
    }
}
