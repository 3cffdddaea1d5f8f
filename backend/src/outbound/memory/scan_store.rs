//! In-process scan store with push notification.
//!
//! Each identity owns a partition holding its records in timestamp order and a
//! watch channel that republishes the whole partition after every append.
//! Subscribers therefore always see complete snapshots. Rapid appends may be
//! coalesced into a single snapshot, but the latest state is never skipped.
//! Partitions with no records and no live subscriber are dropped whenever
//! another feed is opened, so anonymous viewers do not accumulate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;
use mockable::Clock;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{ScanSnapshotStream, ScanStore, ScanStoreError};
use crate::domain::{IdentityId, NewScanRecord, ScanOrder, ScanRecord, ScanRecordId};

type Snapshot = Arc<Vec<ScanRecord>>;

struct Partition {
    // Oldest first; ties keep insertion order.
    records: Vec<ScanRecord>,
    feed: watch::Sender<Snapshot>,
}

impl Partition {
    fn new() -> Self {
        let (feed, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            records: Vec::new(),
            feed,
        }
    }

    fn is_idle(&self) -> bool {
        self.records.is_empty() && self.feed.receiver_count() == 0
    }
}

/// Scan store kept in memory for the lifetime of the process.
pub struct InMemoryScanStore {
    partitions: Mutex<HashMap<IdentityId, Partition>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryScanStore {
    /// Create an empty store stamping records with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            partitions: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

fn ordered(snapshot: &[ScanRecord], order: ScanOrder) -> Vec<ScanRecord> {
    match order {
        ScanOrder::OldestFirst => snapshot.to_vec(),
        ScanOrder::NewestFirst => snapshot.iter().rev().cloned().collect(),
    }
}

#[async_trait]
impl ScanStore for InMemoryScanStore {
    async fn append(&self, draft: NewScanRecord) -> Result<ScanRecordId, ScanStoreError> {
        let mut partitions = self
            .partitions
            .lock()
            .map_err(|_| ScanStoreError::write("scan store lock poisoned"))?;
        let user_id = draft.user_id.clone();
        let partition = partitions
            .entry(user_id.clone())
            .or_insert_with(Partition::new);

        let id = ScanRecordId::new(Uuid::new_v4().simple().to_string());
        let record = ScanRecord::from_draft(id.clone(), draft, self.clock.utc());
        let position = partition
            .records
            .partition_point(|existing| existing.timestamp() <= record.timestamp());
        partition.records.insert(position, record);
        partition
            .feed
            .send_replace(Arc::new(partition.records.clone()));

        debug!(user_id = %user_id, scan_id = %id, "scan appended");
        Ok(id)
    }

    async fn subscribe(
        &self,
        user_id: &IdentityId,
        order: ScanOrder,
    ) -> Result<ScanSnapshotStream, ScanStoreError> {
        let receiver = {
            let mut partitions = self
                .partitions
                .lock()
                .map_err(|_| ScanStoreError::connection("scan store lock poisoned"))?;
            partitions.retain(|_, partition| !partition.is_idle());
            partitions
                .entry(user_id.clone())
                .or_insert_with(Partition::new)
                .feed
                .subscribe()
        };

        let snapshots = stream::unfold((receiver, true), move |(mut receiver, first)| async move {
            if !first && receiver.changed().await.is_err() {
                return None;
            }
            let snapshot = ordered(&receiver.borrow_and_update(), order);
            Some((Ok(snapshot), (receiver, false)))
        });
        Ok(Box::pin(snapshots))
    }
}
