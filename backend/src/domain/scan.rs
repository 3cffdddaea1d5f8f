//! Scan data model: the submitted photo, the model's answer, and the stored
//! record.
//!
//! ## Invariants
//! - An [`ImagePayload`] is never blank. No format validation happens here;
//!   the analysis adapter owns decoding.
//! - An [`AnalysisResult`] always names the food.
//! - A [`ScanRecord`] is created once by the store and never mutated.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::IdentityId;

/// Self-describing encoded image, e.g. `data:image/png;base64,AAAA`.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload(String);

/// Returned when an image payload is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no photo data provided")]
pub struct EmptyImagePayload;

impl ImagePayload {
    /// Accept any non-blank payload.
    ///
    /// # Examples
    /// ```
    /// use nutrisnap::domain::ImagePayload;
    ///
    /// assert!(ImagePayload::new("data:image/png;base64,AAAA").is_ok());
    /// assert!(ImagePayload::new("   ").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, EmptyImagePayload> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(EmptyImagePayload);
        }
        Ok(Self(raw))
    }

    /// Borrow the encoded payload.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

// Payloads are large base64 blobs; keep them out of logs.
impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Validation errors raised when building an [`AnalysisResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisResultValidationError {
    /// The model did not name the food.
    #[error("food name must not be empty")]
    EmptyFoodName,
}

/// Food identification and nutrition description returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    food_name: String,
    nutrition_information: String,
}

impl AnalysisResult {
    /// Validate and build a result. The food name is trimmed; the nutrition
    /// text is kept verbatim because line breaks separate facts.
    ///
    /// # Examples
    /// ```
    /// use nutrisnap::domain::AnalysisResult;
    ///
    /// let result = AnalysisResult::new(" Rice ", "Calories: 200\nProtein: 4g")
    ///     .expect("valid result");
    /// assert_eq!(result.food_name(), "Rice");
    /// assert_eq!(result.nutrition_facts().count(), 2);
    /// ```
    pub fn new(
        food_name: impl Into<String>,
        nutrition_information: impl Into<String>,
    ) -> Result<Self, AnalysisResultValidationError> {
        let food_name = food_name.into().trim().to_owned();
        if food_name.is_empty() {
            return Err(AnalysisResultValidationError::EmptyFoodName);
        }
        Ok(Self {
            food_name,
            nutrition_information: nutrition_information.into(),
        })
    }

    /// Identified food.
    pub fn food_name(&self) -> &str {
        self.food_name.as_str()
    }

    /// Free-text nutrition description.
    pub fn nutrition_information(&self) -> &str {
        self.nutrition_information.as_str()
    }

    /// Non-blank lines of the nutrition description, one fact per line.
    pub fn nutrition_facts(&self) -> impl Iterator<Item = &str> {
        self.nutrition_information
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

/// Identifier assigned by the scan store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanRecordId(String);

impl ScanRecordId {
    /// Wrap a store-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl AsRef<str> for ScanRecordId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ScanRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Draft handed to the store; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScanRecord {
    /// Owner and partition key.
    pub user_id: IdentityId,
    /// Analysis being persisted.
    pub result: AnalysisResult,
}

/// Persisted scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    id: ScanRecordId,
    user_id: IdentityId,
    food_name: String,
    nutrition_information: String,
    timestamp: DateTime<Utc>,
}

impl ScanRecord {
    /// Materialise a stored record from a draft plus store-assigned fields.
    pub fn from_draft(id: ScanRecordId, draft: NewScanRecord, timestamp: DateTime<Utc>) -> Self {
        let NewScanRecord { user_id, result } = draft;
        Self {
            id,
            user_id,
            food_name: result.food_name,
            nutrition_information: result.nutrition_information,
            timestamp,
        }
    }

    /// Store-assigned identifier.
    pub fn id(&self) -> &ScanRecordId {
        &self.id
    }

    /// Owning identity.
    pub fn user_id(&self) -> &IdentityId {
        &self.user_id
    }

    /// Identified food.
    pub fn food_name(&self) -> &str {
        self.food_name.as_str()
    }

    /// Free-text nutrition description.
    pub fn nutrition_information(&self) -> &str {
        self.nutrition_information.as_str()
    }

    /// Store-assigned creation time.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Ordering requested from a live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOrder {
    /// Most recent first; used for display.
    #[default]
    NewestFirst,
    /// Oldest first.
    OldestFirst,
}
