//! Typed outcomes of the scan pipeline and history feed.

use serde::{Deserialize, Serialize};

use super::{AnalysisResult, ScanRecordId};

/// Failure category reported alongside a [`ScanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanErrorKind {
    /// The photo payload was missing or empty.
    InvalidInput,
    /// The analysis service failed or returned unusable output.
    AnalysisFailed,
    /// Storing the scan failed after a successful analysis.
    PersistenceFailed,
    /// The live history feed failed.
    SubscriptionFailed,
}

/// Failures surfaced by the scan pipeline and the history synchroniser.
///
/// None of these are fatal; each is reported to the immediate caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// Missing or empty payload; no collaborator was called.
    #[error("{message}")]
    InvalidInput { message: String },
    /// Surfaced verbatim from the analysis service.
    #[error("analysis failed: {reason}")]
    AnalysisFailed { reason: String },
    /// Partial failure: the analysis result is still returned.
    #[error("saving the scan failed: {reason}")]
    PersistenceFailed { reason: String },
    /// The last delivered snapshot stays the last-known-good view.
    #[error("scan history feed failed: {reason}")]
    SubscriptionFailed { reason: String },
}

impl ScanError {
    /// Helper for [`ScanError::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Helper for [`ScanError::AnalysisFailed`].
    pub fn analysis_failed(reason: impl Into<String>) -> Self {
        Self::AnalysisFailed {
            reason: reason.into(),
        }
    }

    /// Helper for [`ScanError::PersistenceFailed`].
    pub fn persistence_failed(reason: impl Into<String>) -> Self {
        Self::PersistenceFailed {
            reason: reason.into(),
        }
    }

    /// Helper for [`ScanError::SubscriptionFailed`].
    pub fn subscription_failed(reason: impl Into<String>) -> Self {
        Self::SubscriptionFailed {
            reason: reason.into(),
        }
    }

    /// Category of this failure.
    pub fn kind(&self) -> ScanErrorKind {
        match self {
            Self::InvalidInput { .. } => ScanErrorKind::InvalidInput,
            Self::AnalysisFailed { .. } => ScanErrorKind::AnalysisFailed,
            Self::PersistenceFailed { .. } => ScanErrorKind::PersistenceFailed,
            Self::SubscriptionFailed { .. } => ScanErrorKind::SubscriptionFailed,
        }
    }
}

/// Result of one pipeline invocation.
///
/// Analysis success and persistence success are independent: a `Success`
/// may carry a `persistence_error` and no `record_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The photo was analysed.
    Success {
        /// The model's answer.
        result: AnalysisResult,
        /// Present when the scan was stored.
        record_id: Option<ScanRecordId>,
        /// Present when storing the scan failed.
        persistence_error: Option<ScanError>,
    },
    /// Nothing was analysed.
    Failure(ScanError),
}

impl ScanOutcome {
    /// Whether the analysis succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Analysis result, when present.
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Success { result, .. } => Some(result),
            Self::Failure(_) => None,
        }
    }

    /// Stored record id, when the scan was persisted.
    pub fn record_id(&self) -> Option<&ScanRecordId> {
        match self {
            Self::Success { record_id, .. } => record_id.as_ref(),
            Self::Failure(_) => None,
        }
    }

    /// Error kind of a failed outcome.
    pub fn error_kind(&self) -> Option<ScanErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(error) => Some(error.kind()),
        }
    }
}
