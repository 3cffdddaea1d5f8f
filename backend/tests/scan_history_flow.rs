//! End-to-end behaviour of the scan pipeline feeding the live history.
//!
//! Uses the in-memory store and identity provider so the whole flow runs
//! in-process.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use tokio::sync::mpsc;
use tokio::time::timeout;

use nutrisnap::domain::ports::{
    FoodAnalysisError, FoodAnalysisService, IdentityProvider, ScanStore,
};
use nutrisnap::domain::{
    AnalysisResult, HistoryHandle, HistorySynchronizer, Identity, IdentityId, ImagePayload,
    ScanError, ScanOutcome, ScanPipeline, ScanRecord,
};
use nutrisnap::outbound::memory::{InMemoryIdentityProvider, InMemoryScanStore};

const PHOTO: &str = "data:image/png;base64,AAAA";
const WAIT: Duration = Duration::from_secs(2);

/// Analyser that always recognises rice.
struct RiceAnalyser;

#[async_trait]
impl FoodAnalysisService for RiceAnalyser {
    async fn analyze(&self, _image: &ImagePayload) -> Result<AnalysisResult, FoodAnalysisError> {
        AnalysisResult::new("Rice", "Calories: 200\nProtein: 4g")
            .map_err(|err| FoodAnalysisError::decode(err.to_string()))
    }
}

#[fixture]
fn store() -> Arc<dyn ScanStore> {
    Arc::new(InMemoryScanStore::new(Arc::new(DefaultClock)))
}

fn identity(id: &str) -> Identity {
    Identity::new(IdentityId::new(id).expect("valid id"), true)
}

type Snapshots = mpsc::UnboundedReceiver<Vec<ScanRecord>>;

fn watch_into_channel(
    synchronizer: &HistorySynchronizer,
    identity: &Identity,
) -> (HistoryHandle, Snapshots) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = synchronizer.watch(
        Some(identity),
        move |records: &[ScanRecord]| {
            let _ = tx.send(records.to_vec());
        },
        |error| panic!("unexpected history error: {error}"),
    );
    (handle, rx)
}

async fn next_non_empty(snapshots: &mut Snapshots) -> Vec<ScanRecord> {
    loop {
        let snapshot = timeout(WAIT, snapshots.recv())
            .await
            .expect("snapshot within timeout")
            .expect("history feed open");
        if !snapshot.is_empty() {
            return snapshot;
        }
    }
}

#[rstest]
#[tokio::test]
async fn stored_scan_appears_first_in_history(store: Arc<dyn ScanStore>) {
    let pipeline = ScanPipeline::new(Arc::new(RiceAnalyser), Arc::clone(&store));
    let user = identity("u1");

    let outcome = pipeline.analyze(PHOTO, Some(&user)).await;

    let ScanOutcome::Success {
        result, record_id, ..
    } = outcome
    else {
        panic!("expected a successful scan");
    };
    assert_eq!(result.food_name(), "Rice");
    let record_id = record_id.expect("scan should be stored");

    let synchronizer = HistorySynchronizer::new(store);
    let (handle, mut snapshots) = watch_into_channel(&synchronizer, &user);
    let snapshot = next_non_empty(&mut snapshots).await;
    handle.cancel();

    let first = snapshot.first().expect("one record");
    assert_eq!(first.food_name(), "Rice");
    assert_eq!(first.id(), &record_id);
    assert_eq!(first.user_id(), user.id());
}

#[rstest]
#[tokio::test]
async fn newest_scan_leads_the_snapshot(store: Arc<dyn ScanStore>) {
    let pipeline = ScanPipeline::new(Arc::new(RiceAnalyser), Arc::clone(&store));
    let user = identity("u1");
    let synchronizer = HistorySynchronizer::new(Arc::clone(&store));
    let (handle, mut snapshots) = watch_into_channel(&synchronizer, &user);

    let first = pipeline.analyze(PHOTO, Some(&user)).await;
    let second = pipeline.analyze(PHOTO, Some(&user)).await;
    let second_id = second.record_id().cloned().expect("second scan stored");
    assert!(first.record_id().is_some());

    let snapshot = loop {
        let snapshot = next_non_empty(&mut snapshots).await;
        if snapshot.len() == 2 {
            break snapshot;
        }
    };
    handle.cancel();

    assert_eq!(snapshot.first().map(ScanRecord::id), Some(&second_id));
}

#[rstest]
#[tokio::test]
async fn following_a_new_identity_swaps_the_view(store: Arc<dyn ScanStore>) {
    let pipeline = ScanPipeline::new(Arc::new(RiceAnalyser), Arc::clone(&store));
    let provider = InMemoryIdentityProvider::new(true);
    let original = provider.sign_in_anonymous().await.expect("sign in");
    pipeline.analyze(PHOTO, Some(&original)).await;

    let (tx, mut snapshots) = mpsc::unbounded_channel::<Vec<ScanRecord>>();
    let synchronizer = HistorySynchronizer::new(Arc::clone(&store));
    let mut follower = synchronizer.follow(
        provider.subscribe(),
        Arc::new(move |records: &[ScanRecord]| {
            let _ = tx.send(records.to_vec());
        }),
        Arc::new(|error: &ScanError| panic!("unexpected history error: {error}")),
    );

    let before = next_non_empty(&mut snapshots).await;
    assert!(before.iter().all(|record| record.user_id() == original.id()));

    provider.sign_out().await.expect("sign out");
    let reissued = provider.current().expect("auto re-issued identity");
    assert_ne!(reissued.id(), original.id());
    pipeline.analyze(PHOTO, Some(&reissued)).await;

    let after = next_non_empty(&mut snapshots).await;
    follower.stop();

    assert_eq!(after.len(), 1);
    assert!(after.iter().all(|record| record.user_id() == reissued.id()));
}
