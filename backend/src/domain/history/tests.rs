//! Tests for the history synchroniser and identity follower.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures::channel::mpsc as feed;
use rstest::{fixture, rstest};
use tokio::sync::{mpsc, watch};

use super::*;
use crate::domain::ports::{MockScanStore, ScanSnapshotStream, ScanStoreError};
use crate::domain::{AnalysisResult, NewScanRecord, ScanErrorKind, ScanRecordId};

type Feed = feed::UnboundedSender<Result<Vec<ScanRecord>, ScanStoreError>>;

const WAIT: Duration = Duration::from_secs(1);
const QUIET: Duration = Duration::from_millis(50);

fn identity(id: &str) -> Identity {
    Identity::new(IdentityId::new(id).expect("valid id"), true)
}

fn record(id: &str, user: &str, food: &str) -> ScanRecord {
    ScanRecord::from_draft(
        ScanRecordId::new(id),
        NewScanRecord {
            user_id: IdentityId::new(user).expect("valid id"),
            result: AnalysisResult::new(food, "Calories: 100").expect("valid result"),
        },
        Utc.timestamp_opt(1_700_000_000, 0)
            .single()
            .expect("valid timestamp"),
    )
}

/// Register one subscription for `user` and return the sender feeding it.
fn expect_feed(store: &mut MockScanStore, user: &'static str) -> Feed {
    let (tx, rx) = feed::unbounded();
    store
        .expect_subscribe()
        .times(1)
        .withf(move |id, order| id.as_ref() == user && *order == ScanOrder::NewestFirst)
        .return_once(move |_, _| {
            let stream: ScanSnapshotStream = Box::pin(rx);
            Ok(stream)
        });
    tx
}

struct Recorder {
    updates: mpsc::UnboundedReceiver<Vec<String>>,
    errors: mpsc::UnboundedReceiver<ScanError>,
}

type Channels = (
    mpsc::UnboundedSender<Vec<String>>,
    mpsc::UnboundedSender<ScanError>,
    Recorder,
);

#[fixture]
fn channels() -> Channels {
    let (update_tx, updates) = mpsc::unbounded_channel();
    let (error_tx, errors) = mpsc::unbounded_channel();
    (update_tx, error_tx, Recorder { updates, errors })
}

fn on_update(
    tx: mpsc::UnboundedSender<Vec<String>>,
) -> impl Fn(&[ScanRecord]) + Send + Sync + 'static {
    move |records: &[ScanRecord]| {
        let names = records
            .iter()
            .map(|record| record.food_name().to_owned())
            .collect();
        let _ = tx.send(names);
    }
}

fn on_error(tx: mpsc::UnboundedSender<ScanError>) -> impl Fn(&ScanError) + Send + Sync + 'static {
    move |error: &ScanError| {
        let _ = tx.send(error.clone());
    }
}

impl Recorder {
    async fn next_update(&mut self) -> Vec<String> {
        tokio::time::timeout(WAIT, self.updates.recv())
            .await
            .expect("update before timeout")
            .expect("update channel open")
    }

    async fn next_error(&mut self) -> ScanError {
        tokio::time::timeout(WAIT, self.errors.recv())
            .await
            .expect("error before timeout")
            .expect("error channel open")
    }

    async fn assert_no_update(&mut self) {
        let observed = tokio::time::timeout(QUIET, self.updates.recv()).await;
        assert!(
            !matches!(observed, Ok(Some(_))),
            "unexpected update: {observed:?}"
        );
    }
}

async fn wait_for_state(synchronizer: &HistorySynchronizer, expected: SubscriptionState) {
    for _ in 0..200 {
        if synchronizer.state() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("state never became {expected:?}; last {:?}", synchronizer.state());
}

#[rstest]
fn no_identity_delivers_empty_view_before_returning(
    channels: Channels,
) {
    let (update_tx, error_tx, mut recorder) = channels;
    let mut store = MockScanStore::new();
    store.expect_subscribe().times(0);
    let synchronizer = HistorySynchronizer::new(Arc::new(store));

    let handle = synchronizer.watch(None, on_update(update_tx), on_error(error_tx));

    assert_eq!(recorder.updates.try_recv().ok(), Some(Vec::new()));
    assert_eq!(handle.state(), SubscriptionState::Idle);
    assert_eq!(synchronizer.state(), SubscriptionState::Idle);
}

#[rstest]
#[tokio::test]
async fn delivers_complete_snapshots_in_store_order(
    channels: Channels,
) {
    let (update_tx, error_tx, mut recorder) = channels;
    let mut store = MockScanStore::new();
    let feed = expect_feed(&mut store, "u1");
    let synchronizer = HistorySynchronizer::new(Arc::new(store));
    assert_eq!(synchronizer.state(), SubscriptionState::Idle);

    let _handle = synchronizer.watch(
        Some(&identity("u1")),
        on_update(update_tx),
        on_error(error_tx),
    );
    wait_for_state(&synchronizer, SubscriptionState::Live).await;

    feed.unbounded_send(Ok(vec![record("s1", "u1", "Rice")]))
        .expect("feed open");
    assert_eq!(recorder.next_update().await, vec!["Rice"]);

    feed.unbounded_send(Ok(vec![
        record("s2", "u1", "Dal"),
        record("s1", "u1", "Rice"),
    ]))
    .expect("feed open");
    assert_eq!(recorder.next_update().await, vec!["Dal", "Rice"]);
}

#[rstest]
#[tokio::test]
async fn switching_identity_drops_previous_partition(
    channels: Channels,
) {
    let (update_tx, error_tx, mut recorder) = channels;
    let mut store = MockScanStore::new();
    let first = expect_feed(&mut store, "u1");
    let second = expect_feed(&mut store, "u2");
    let synchronizer = HistorySynchronizer::new(Arc::new(store));

    let first_handle = synchronizer.watch(
        Some(&identity("u1")),
        on_update(update_tx.clone()),
        on_error(error_tx.clone()),
    );
    wait_for_state(&synchronizer, SubscriptionState::Live).await;
    first
        .unbounded_send(Ok(vec![record("s1", "u1", "Rice")]))
        .expect("feed open");
    assert_eq!(recorder.next_update().await, vec!["Rice"]);

    let _second_handle = synchronizer.watch(
        Some(&identity("u2")),
        on_update(update_tx),
        on_error(error_tx),
    );
    assert_eq!(first_handle.state(), SubscriptionState::Cancelled);

    let _ = first.unbounded_send(Ok(vec![record("s3", "u1", "Fish curry")]));
    recorder.assert_no_update().await;

    second
        .unbounded_send(Ok(vec![record("s2", "u2", "Paratha")]))
        .expect("feed open");
    assert_eq!(recorder.next_update().await, vec!["Paratha"]);
}

#[rstest]
#[tokio::test]
async fn cancel_suppresses_snapshot_already_in_flight(
    channels: Channels,
) {
    let (update_tx, error_tx, mut recorder) = channels;
    let mut store = MockScanStore::new();
    let feed = expect_feed(&mut store, "u1");
    let synchronizer = HistorySynchronizer::new(Arc::new(store));

    let handle = synchronizer.watch(
        Some(&identity("u1")),
        on_update(update_tx),
        on_error(error_tx),
    );
    wait_for_state(&synchronizer, SubscriptionState::Live).await;

    // Queued but not yet polled by the delivery task.
    let _ = feed.unbounded_send(Ok(vec![record("s1", "u1", "Rice")]));
    handle.cancel();

    recorder.assert_no_update().await;
    assert_eq!(handle.state(), SubscriptionState::Cancelled);
    assert!(recorder.errors.try_recv().is_err());
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_waits_for_running_callback() {
    let mut store = MockScanStore::new();
    let feed = expect_feed(&mut store, "u1");
    let synchronizer = HistorySynchronizer::new(Arc::new(store));
    let (entered_tx, entered_rx) = std::sync::mpsc::channel();
    let finished = Arc::new(AtomicBool::new(false));
    let callback_finished = Arc::clone(&finished);

    let handle = synchronizer.watch(
        Some(&identity("u1")),
        move |_records: &[ScanRecord]| {
            let _ = entered_tx.send(());
            std::thread::sleep(Duration::from_millis(100));
            callback_finished.store(true, Ordering::SeqCst);
        },
        |_error: &ScanError| {},
    );
    wait_for_state(&synchronizer, SubscriptionState::Live).await;
    feed.unbounded_send(Ok(Vec::new())).expect("feed open");
    tokio::task::spawn_blocking(move || entered_rx.recv_timeout(WAIT))
        .await
        .expect("join blocking task")
        .expect("callback entered");

    handle.cancel();

    assert!(finished.load(Ordering::SeqCst));
}

#[rstest]
#[tokio::test]
async fn cancel_from_inside_callback_stops_delivery(
    channels: Channels,
) {
    let (update_tx, error_tx, mut recorder) = channels;
    let mut store = MockScanStore::new();
    let feed = expect_feed(&mut store, "u1");
    let synchronizer = HistorySynchronizer::new(Arc::new(store));
    let slot: Arc<Mutex<Option<HistoryHandle>>> = Arc::new(Mutex::new(None));
    let callback_slot = Arc::clone(&slot);
    let forward = on_update(update_tx);

    let handle = synchronizer.watch(
        Some(&identity("u1")),
        move |records: &[ScanRecord]| {
            forward(records);
            if let Some(handle) = callback_slot.lock().expect("slot lock").as_ref() {
                handle.cancel();
            }
        },
        on_error(error_tx),
    );
    *slot.lock().expect("slot lock") = Some(handle);
    wait_for_state(&synchronizer, SubscriptionState::Live).await;

    feed.unbounded_send(Ok(vec![record("s1", "u1", "Rice")]))
        .expect("feed open");
    let _ = feed.unbounded_send(Ok(vec![record("s2", "u1", "Dal")]));

    assert_eq!(recorder.next_update().await, vec!["Rice"]);
    recorder.assert_no_update().await;
    assert_eq!(synchronizer.state(), SubscriptionState::Cancelled);
}

#[rstest]
#[tokio::test]
async fn stream_error_is_reported_once(
    channels: Channels,
) {
    let (update_tx, error_tx, mut recorder) = channels;
    let mut store = MockScanStore::new();
    let feed = expect_feed(&mut store, "u1");
    let synchronizer = HistorySynchronizer::new(Arc::new(store));

    let _handle = synchronizer.watch(
        Some(&identity("u1")),
        on_update(update_tx),
        on_error(error_tx),
    );
    wait_for_state(&synchronizer, SubscriptionState::Live).await;
    feed.unbounded_send(Ok(vec![record("s1", "u1", "Rice")]))
        .expect("feed open");
    assert_eq!(recorder.next_update().await, vec!["Rice"]);

    feed.unbounded_send(Err(ScanStoreError::subscription("listener lost")))
        .expect("feed open");
    let _ = feed.unbounded_send(Ok(vec![record("s2", "u1", "Dal")]));

    let error = recorder.next_error().await;
    assert_eq!(error.kind(), ScanErrorKind::SubscriptionFailed);
    assert!(error.to_string().contains("listener lost"));
    recorder.assert_no_update().await;
    assert!(recorder.errors.try_recv().is_err());
    assert_eq!(synchronizer.state(), SubscriptionState::Errored);
}

#[rstest]
#[tokio::test]
async fn closed_feed_is_reported(
    channels: Channels,
) {
    let (update_tx, error_tx, mut recorder) = channels;
    let mut store = MockScanStore::new();
    let feed = expect_feed(&mut store, "u1");
    let synchronizer = HistorySynchronizer::new(Arc::new(store));

    let _handle = synchronizer.watch(
        Some(&identity("u1")),
        on_update(update_tx),
        on_error(error_tx),
    );
    drop(feed);

    let error = recorder.next_error().await;
    assert_eq!(error.kind(), ScanErrorKind::SubscriptionFailed);
    assert_eq!(synchronizer.state(), SubscriptionState::Errored);
}

#[rstest]
#[tokio::test]
async fn subscribe_failure_is_reported(
    channels: Channels,
) {
    let (update_tx, error_tx, mut recorder) = channels;
    let mut store = MockScanStore::new();
    store
        .expect_subscribe()
        .times(1)
        .return_once(|_, _| Err(ScanStoreError::connection("offline")));
    let synchronizer = HistorySynchronizer::new(Arc::new(store));

    let handle = synchronizer.watch(
        Some(&identity("u1")),
        on_update(update_tx),
        on_error(error_tx),
    );

    let error = recorder.next_error().await;
    assert!(error.to_string().contains("offline"));
    assert_eq!(handle.state(), SubscriptionState::Errored);
    assert!(recorder.updates.try_recv().is_err());
}

#[rstest]
fn watch_outside_runtime_reports_failure(
    channels: Channels,
) {
    let (update_tx, error_tx, mut recorder) = channels;
    let mut store = MockScanStore::new();
    store.expect_subscribe().times(0);
    let synchronizer = HistorySynchronizer::new(Arc::new(store));

    let handle = synchronizer.watch(
        Some(&identity("u1")),
        on_update(update_tx),
        on_error(error_tx),
    );

    let error = recorder.errors.try_recv().expect("error reported");
    assert_eq!(error.kind(), ScanErrorKind::SubscriptionFailed);
    assert_eq!(handle.state(), SubscriptionState::Errored);
}

fn shared_callbacks(
    update_tx: mpsc::UnboundedSender<Vec<String>>,
    error_tx: mpsc::UnboundedSender<ScanError>,
) -> (UpdateCallback, ErrorCallback) {
    (
        Arc::new(on_update(update_tx)),
        Arc::new(on_error(error_tx)),
    )
}

#[rstest]
#[tokio::test]
async fn follow_swaps_view_on_identity_change(
    channels: Channels,
) {
    let (update_tx, error_tx, mut recorder) = channels;
    let mut store = MockScanStore::new();
    let first = expect_feed(&mut store, "u1");
    let second = expect_feed(&mut store, "u2");
    first
        .unbounded_send(Ok(vec![record("s1", "u1", "Rice")]))
        .expect("feed open");
    second
        .unbounded_send(Ok(vec![record("s2", "u2", "Paratha")]))
        .expect("feed open");
    let synchronizer = HistorySynchronizer::new(Arc::new(store));
    let (identity_tx, identity_rx) = watch::channel(None);
    let (update, error) = shared_callbacks(update_tx, error_tx);

    let _follower = synchronizer.follow(identity_rx, update, error);
    assert_eq!(recorder.next_update().await, Vec::<String>::new());

    identity_tx.send_replace(Some(identity("u1")));
    assert_eq!(recorder.next_update().await, vec!["Rice"]);

    identity_tx.send_replace(Some(identity("u2")));
    assert_eq!(recorder.next_update().await, vec!["Paratha"]);

    let _ = first.unbounded_send(Ok(vec![record("s3", "u1", "Fish curry")]));
    recorder.assert_no_update().await;
}

#[rstest]
#[tokio::test]
async fn follow_ignores_repeated_identity(
    channels: Channels,
) {
    let (update_tx, error_tx, mut recorder) = channels;
    let mut store = MockScanStore::new();
    let feed = expect_feed(&mut store, "u1");
    let synchronizer = HistorySynchronizer::new(Arc::new(store));
    let (identity_tx, identity_rx) = watch::channel(Some(identity("u1")));
    let (update, error) = shared_callbacks(update_tx, error_tx);

    let _follower = synchronizer.follow(identity_rx, update, error);
    wait_for_state(&synchronizer, SubscriptionState::Live).await;

    identity_tx.send_replace(Some(identity("u1")));
    tokio::task::yield_now().await;

    feed.unbounded_send(Ok(vec![record("s1", "u1", "Rice")]))
        .expect("subscription still open");
    assert_eq!(recorder.next_update().await, vec!["Rice"]);
    assert_eq!(synchronizer.state(), SubscriptionState::Live);
}

#[rstest]
#[tokio::test]
async fn stopping_follower_releases_subscription(
    channels: Channels,
) {
    let (update_tx, error_tx, mut recorder) = channels;
    let mut store = MockScanStore::new();
    let feed = expect_feed(&mut store, "u1");
    let synchronizer = HistorySynchronizer::new(Arc::new(store));
    let (_identity_tx, identity_rx) = watch::channel(Some(identity("u1")));
    let (update, error) = shared_callbacks(update_tx, error_tx);

    let mut follower = synchronizer.follow(identity_rx, update, error);
    wait_for_state(&synchronizer, SubscriptionState::Live).await;
    follower.stop();

    let _ = feed.unbounded_send(Ok(vec![record("s1", "u1", "Rice")]));
    recorder.assert_no_update().await;
}
