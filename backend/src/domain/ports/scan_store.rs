//! Driven port for the per-identity scan collection.
//!
//! The store assigns record ids and timestamps, and offers a live
//! subscription that yields the complete ordered collection on every change.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt, stream};

use crate::domain::{IdentityId, NewScanRecord, ScanOrder, ScanRecord, ScanRecordId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by scan store adapters.
    pub enum ScanStoreError {
        /// The backing store could not be reached.
        Connection { message: String } =>
            "scan store connection failed: {message}",
        /// Appending a record failed.
        Write { message: String } =>
            "scan store write failed: {message}",
        /// The live subscription failed or was closed by the store.
        Subscription { message: String } =>
            "scan store subscription failed: {message}",
    }
}

/// Stream of full snapshots for one identity.
///
/// The first item is the current collection. Each later item is the complete
/// collection after a change, never a delta.
pub type ScanSnapshotStream =
    Pin<Box<dyn Stream<Item = Result<Vec<ScanRecord>, ScanStoreError>> + Send>>;

/// Port for appending scans and following a user's collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Append a record; the store assigns id and creation timestamp.
    async fn append(&self, draft: NewScanRecord) -> Result<ScanRecordId, ScanStoreError>;

    /// Open a live subscription to the records owned by `user_id`.
    ///
    /// Records never leak across partitions.
    async fn subscribe(
        &self,
        user_id: &IdentityId,
        order: ScanOrder,
    ) -> Result<ScanSnapshotStream, ScanStoreError>;
}

/// Fixture store that accepts writes and reports an empty, quiet collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureScanStore;

#[async_trait]
impl ScanStore for FixtureScanStore {
    async fn append(&self, _draft: NewScanRecord) -> Result<ScanRecordId, ScanStoreError> {
        Ok(ScanRecordId::new("fixture-scan"))
    }

    async fn subscribe(
        &self,
        _user_id: &IdentityId,
        _order: ScanOrder,
    ) -> Result<ScanSnapshotStream, ScanStoreError> {
        let initial = stream::once(async { Ok(Vec::new()) });
        Ok(Box::pin(initial.chain(stream::pending())))
    }
}
