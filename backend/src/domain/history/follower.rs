//! Re-subscribes the synchroniser whenever the current identity changes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{ErrorCallback, HistoryHandle, HistorySynchronizer, UpdateCallback};
use crate::domain::{Identity, IdentityId, ScanError, ScanRecord};

/// Handle to a running identity follower. Dropping it stops the follower.
#[must_use = "dropping the handle stops following identity changes"]
#[derive(Debug)]
pub struct FollowHandle {
    stopped: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    synchronizer: HistorySynchronizer,
}

impl FollowHandle {
    /// Stop following and release the active subscription.
    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.synchronizer.release();
    }
}

impl Drop for FollowHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl HistorySynchronizer {
    /// Follow identity changes published on `identities`.
    ///
    /// Each distinct identity (by id) replaces the delivered view: the
    /// previous subscription is released before the next one opens, so
    /// partitions never merge. Repeated publications of the same id are
    /// ignored. Outside a tokio runtime `on_error` reports
    /// `SubscriptionFailed` and nothing is followed.
    pub fn follow(
        &self,
        identities: watch::Receiver<Option<Identity>>,
        on_update: UpdateCallback,
        on_error: ErrorCallback,
    ) -> FollowHandle {
        let stopped = Arc::new(AtomicBool::new(false));
        let task = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(follow_identities(
                self.clone(),
                identities,
                on_update,
                on_error,
                Arc::clone(&stopped),
            ))),
            Err(_) => {
                on_error(&ScanError::subscription_failed("no async runtime available"));
                None
            }
        };
        FollowHandle {
            stopped,
            task,
            synchronizer: self.clone(),
        }
    }
}

async fn follow_identities(
    synchronizer: HistorySynchronizer,
    mut identities: watch::Receiver<Option<Identity>>,
    on_update: UpdateCallback,
    on_error: ErrorCallback,
    stopped: Arc<AtomicBool>,
) {
    let mut followed: Option<Option<IdentityId>> = None;
    let mut _handle: Option<HistoryHandle> = None;

    loop {
        let identity = identities.borrow_and_update().clone();
        let id = identity.as_ref().map(|identity| identity.id().clone());
        if followed.as_ref() != Some(&id) {
            debug!(user_id = ?id, "identity changed; resubscribing history");
            followed = Some(id);
            if stopped.load(Ordering::SeqCst) {
                return;
            }
            let update = Arc::clone(&on_update);
            let error = Arc::clone(&on_error);
            let handle = synchronizer.watch(
                identity.as_ref(),
                move |records: &[ScanRecord]| update(records),
                move |err: &ScanError| error(err),
            );
            if stopped.load(Ordering::SeqCst) {
                handle.cancel();
                return;
            }
            _handle = Some(handle);
        }

        if identities.changed().await.is_err() {
            break;
        }
    }

    // The publisher is gone; keep the last subscription until stopped.
    std::future::pending::<()>().await;
}
