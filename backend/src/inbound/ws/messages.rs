//! Frames pushed to history feed clients.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ScanError, ScanErrorKind, ScanRecord};

/// One stored scan as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanView {
    /// Store-assigned identifier.
    #[schema(example = "0f8c1f5e9d2a4b7e8c3d6a1b2c4d5e6f")]
    pub id: String,
    #[schema(example = "Steamed rice")]
    pub food_name: String,
    /// Free text, one fact per line.
    #[schema(example = "Calories: 200 kcal\nCarbohydrates: 45 g")]
    pub nutrition_information: String,
    /// Store-assigned creation time.
    pub timestamp: DateTime<Utc>,
}

impl From<&ScanRecord> for ScanView {
    fn from(record: &ScanRecord) -> Self {
        Self {
            id: record.id().to_string(),
            food_name: record.food_name().to_owned(),
            nutrition_information: record.nutrition_information().to_owned(),
            timestamp: record.timestamp(),
        }
    }
}

/// Outbound frame, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryMessage {
    /// The complete current history, newest first.
    Snapshot { scans: Vec<ScanView> },
    /// The feed failed; no further snapshots follow.
    Error {
        code: ScanErrorKind,
        message: String,
    },
}

impl HistoryMessage {
    /// Snapshot frame for `records`, keeping their order.
    pub fn snapshot(records: &[ScanRecord]) -> Self {
        Self::Snapshot {
            scans: records.iter().map(ScanView::from).collect(),
        }
    }
}

impl From<&ScanError> for HistoryMessage {
    fn from(error: &ScanError) -> Self {
        Self::Error {
            code: error.kind(),
            message: error.to_string(),
        }
    }
}
