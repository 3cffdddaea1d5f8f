//! Live, identity-scoped scan history.
//!
//! [`HistorySynchronizer`] keeps a caller's view of the active identity's
//! scans current. Every store change delivers the complete ordered snapshot;
//! callers replace their view wholesale and never merge.
//!
//! ## Lifecycle
//! `Idle -> Subscribing -> Live -> (Cancelled | Errored)`. Only `Live`
//! delivers data. A failure is reported once and is not retried; the last
//! delivered snapshot stays the caller's last-known-good view.

mod follower;
mod subscription;

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use serde::Serialize;
use tracing::{debug, warn};

pub use self::follower::FollowHandle;
pub use self::subscription::HistoryHandle;
use self::subscription::Subscription;
use super::ports::ScanStore;
use super::{Identity, IdentityId, ScanError, ScanOrder, ScanRecord};

/// Lifecycle of a history subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    /// No subscription requested, or no identity to follow.
    Idle,
    /// Waiting for the store to open the feed.
    Subscribing,
    /// Delivering snapshots.
    Live,
    /// Released by the caller.
    Cancelled,
    /// Ended by a store failure.
    Errored,
}

/// Callback receiving each complete snapshot.
pub type UpdateCallback = Arc<dyn Fn(&[ScanRecord]) + Send + Sync>;
/// Callback receiving a terminal subscription failure.
pub type ErrorCallback = Arc<dyn Fn(&ScanError) + Send + Sync>;

/// Follows the scan collection of one identity at a time.
///
/// Clones share the active subscription, so at most one is live per
/// synchroniser and its clones.
#[derive(Clone)]
pub struct HistorySynchronizer {
    store: Arc<dyn ScanStore>,
    current: Arc<Mutex<Option<Arc<Subscription>>>>,
}

impl std::fmt::Debug for HistorySynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistorySynchronizer")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl HistorySynchronizer {
    /// Create a synchroniser reading from `store`.
    pub fn new(store: Arc<dyn ScanStore>) -> Self {
        Self {
            store,
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// State of the most recent subscription, or `Idle` when there is none.
    pub fn state(&self) -> SubscriptionState {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(SubscriptionState::Idle, |subscription| subscription.state())
    }

    /// Start following `identity`'s scans, newest first.
    ///
    /// Any earlier subscription is released before the new one starts.
    /// Without an identity `on_update(&[])` is called before this returns and
    /// no subscription is opened. With one, snapshots arrive on the tokio
    /// runtime; calling this outside a runtime reports `SubscriptionFailed`.
    pub fn watch<U, E>(
        &self,
        identity: Option<&Identity>,
        on_update: U,
        on_error: E,
    ) -> HistoryHandle
    where
        U: Fn(&[ScanRecord]) + Send + Sync + 'static,
        E: Fn(&ScanError) + Send + Sync + 'static,
    {
        self.release();

        let Some(identity) = identity else {
            debug!("no identity; delivering empty history");
            on_update(&[]);
            return HistoryHandle::idle();
        };

        let subscription = Subscription::new(SubscriptionState::Subscribing);
        self.install(Arc::clone(&subscription));

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            let error = ScanError::subscription_failed("no async runtime available");
            warn!(user_id = %identity.id(), error = %error, "history subscription failed");
            subscription.fail(&error, |err| on_error(err));
            return HistoryHandle::active(subscription);
        };

        let task = runtime.spawn(run_subscription(
            Arc::clone(&self.store),
            identity.id().clone(),
            Arc::clone(&subscription),
            on_update,
            on_error,
        ));
        subscription.attach_task(task);
        HistoryHandle::active(subscription)
    }

    /// Release the active subscription, if any.
    pub fn release(&self) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    fn install(&self, subscription: Arc<Subscription>) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(subscription);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }
}

async fn run_subscription<U, E>(
    store: Arc<dyn ScanStore>,
    user_id: IdentityId,
    subscription: Arc<Subscription>,
    on_update: U,
    on_error: E,
) where
    U: Fn(&[ScanRecord]) + Send + Sync + 'static,
    E: Fn(&ScanError) + Send + Sync + 'static,
{
    let report = |error: ScanError| {
        warn!(user_id = %user_id, error = %error, "history subscription failed");
        subscription.fail(&error, |err| on_error(err));
    };

    let mut snapshots = match store.subscribe(&user_id, ScanOrder::NewestFirst).await {
        Ok(snapshots) => snapshots,
        Err(err) => {
            report(ScanError::subscription_failed(err.to_string()));
            return;
        }
    };
    subscription.go_live();
    debug!(user_id = %user_id, "history subscription live");

    while let Some(snapshot) = snapshots.next().await {
        match snapshot {
            Ok(records) => {
                if !subscription.deliver(|| on_update(&records)) {
                    return;
                }
            }
            Err(err) => {
                report(ScanError::subscription_failed(err.to_string()));
                return;
            }
        }
    }
    report(ScanError::subscription_failed("scan store closed the history feed"));
}

#[cfg(test)]
mod tests;
