//! Scan pipeline: analyse a photo, then store the result for the current
//! identity.
//!
//! Analysis strictly precedes persistence within one call. Each call makes at
//! most one analysis request and at most one append; calls share no mutable
//! state, so concurrent scans for the same identity are safe.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::ports::{FoodAnalysisService, ScanCommand, ScanStore, SubmitScanRequest};
use super::{Identity, ImagePayload, NewScanRecord, ScanError, ScanOutcome};

/// Orchestrates the analysis service and the scan store.
pub struct ScanPipeline<A: ?Sized, S: ?Sized> {
    analyzer: Arc<A>,
    store: Arc<S>,
}

impl<A: ?Sized, S: ?Sized> Clone for ScanPipeline<A, S> {
    fn clone(&self) -> Self {
        Self {
            analyzer: Arc::clone(&self.analyzer),
            store: Arc::clone(&self.store),
        }
    }
}

impl<A, S> ScanPipeline<A, S>
where
    A: FoodAnalysisService + ?Sized,
    S: ScanStore + ?Sized,
{
    /// Create a pipeline over the given collaborators.
    pub fn new(analyzer: Arc<A>, store: Arc<S>) -> Self {
        Self { analyzer, store }
    }

    /// Analyse `image` and, when `identity` is present, append the result to
    /// that identity's collection.
    ///
    /// A failed append does not hide the analysis: the outcome is still
    /// `Success` with `persistence_error` set. Without an identity the scan is
    /// analysed and never stored.
    pub async fn analyze(&self, image: &str, identity: Option<&Identity>) -> ScanOutcome {
        let payload = match ImagePayload::new(image) {
            Ok(payload) => payload,
            Err(err) => {
                debug!("rejected scan without photo data");
                return ScanOutcome::Failure(ScanError::invalid_input(err.to_string()));
            }
        };

        let result = match self.analyzer.analyze(&payload).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "food analysis failed");
                return ScanOutcome::Failure(ScanError::analysis_failed(err.to_string()));
            }
        };

        let Some(identity) = identity else {
            debug!(food_name = result.food_name(), "no identity; scan not stored");
            return ScanOutcome::Success {
                result,
                record_id: None,
                persistence_error: None,
            };
        };

        let draft = NewScanRecord {
            user_id: identity.id().clone(),
            result: result.clone(),
        };
        match self.store.append(draft).await {
            Ok(record_id) => {
                info!(
                    user_id = %identity.id(),
                    scan_id = %record_id,
                    food_name = result.food_name(),
                    "scan stored"
                );
                ScanOutcome::Success {
                    result,
                    record_id: Some(record_id),
                    persistence_error: None,
                }
            }
            Err(err) => {
                warn!(user_id = %identity.id(), error = %err, "failed to store scan");
                ScanOutcome::Success {
                    result,
                    record_id: None,
                    persistence_error: Some(ScanError::persistence_failed(err.to_string())),
                }
            }
        }
    }
}

#[async_trait]
impl<A, S> ScanCommand for ScanPipeline<A, S>
where
    A: FoodAnalysisService + ?Sized,
    S: ScanStore + ?Sized,
{
    async fn submit_scan(&self, request: SubmitScanRequest) -> ScanOutcome {
        self.analyze(&request.photo_data_uri, request.identity.as_ref())
            .await
    }
}

#[cfg(test)]
#[path = "scan_pipeline_tests.rs"]
mod tests;
