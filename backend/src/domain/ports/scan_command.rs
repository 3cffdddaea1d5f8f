//! Driving port for submitting a photo for analysis.
//!
//! Inbound adapters call this port; the pipeline implements it.

use async_trait::async_trait;

use crate::domain::{Identity, ScanOutcome};

/// Request accepted by [`ScanCommand::submit_scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitScanRequest {
    /// Encoded photo as received from the client.
    pub photo_data_uri: String,
    /// Identity the scan is attributed to. Without one the scan is analysed
    /// but not stored.
    pub identity: Option<Identity>,
}

/// Driving port for the scan pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScanCommand: Send + Sync {
    /// Analyse a photo and store the result when an identity is present.
    ///
    /// Failures are reported inside the returned [`ScanOutcome`].
    async fn submit_scan(&self, request: SubmitScanRequest) -> ScanOutcome;
}
