//! One live history subscription and the handle that releases it.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use super::SubscriptionState;
use crate::domain::ScanError;

thread_local! {
    // Address of the subscription whose callback runs on this thread, or 0.
    static DELIVERING: Cell<usize> = const { Cell::new(0) };
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks the current thread as running a callback for one subscription.
struct DeliveringGuard {
    previous: usize,
}

impl DeliveringGuard {
    fn enter(subscription: usize) -> Self {
        let previous = DELIVERING.with(|cell| cell.replace(subscription));
        Self { previous }
    }
}

impl Drop for DeliveringGuard {
    fn drop(&mut self) {
        DELIVERING.with(|cell| cell.set(self.previous));
    }
}

/// Shared state of a subscription, owned jointly by the handle, the
/// synchroniser and the delivery task.
#[derive(Debug)]
pub(super) struct Subscription {
    stopped: AtomicBool,
    delivery: Mutex<()>,
    state: Mutex<SubscriptionState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Subscription {
    pub(super) fn new(state: SubscriptionState) -> Arc<Self> {
        Arc::new(Self {
            stopped: AtomicBool::new(false),
            delivery: Mutex::new(()),
            state: Mutex::new(state),
            task: Mutex::new(None),
        })
    }

    fn address(&self) -> usize {
        std::ptr::from_ref(self) as usize
    }

    pub(super) fn state(&self) -> SubscriptionState {
        *lock(&self.state)
    }

    pub(super) fn attach_task(&self, task: JoinHandle<()>) {
        if self.stopped.load(Ordering::SeqCst) {
            task.abort();
            return;
        }
        *lock(&self.task) = Some(task);
    }

    /// Move from `Subscribing` to `Live` unless the subscription already
    /// ended.
    pub(super) fn go_live(&self) {
        let mut state = lock(&self.state);
        if *state == SubscriptionState::Subscribing {
            *state = SubscriptionState::Live;
        }
    }

    /// Run `callback` under the delivery lock. Returns `false`, without
    /// calling it, once the subscription has stopped.
    pub(super) fn deliver(&self, callback: impl FnOnce()) -> bool {
        let _delivery = lock(&self.delivery);
        if self.stopped.load(Ordering::SeqCst) {
            return false;
        }
        let _delivering = DeliveringGuard::enter(self.address());
        callback();
        true
    }

    /// Report a terminal failure once, unless the subscription was cancelled.
    pub(super) fn fail(&self, error: &ScanError, on_error: impl FnOnce(&ScanError)) {
        let _delivery = lock(&self.delivery);
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        *lock(&self.state) = SubscriptionState::Errored;
        let _delivering = DeliveringGuard::enter(self.address());
        on_error(error);
    }

    /// Stop delivering. Blocks while a callback for this subscription runs on
    /// another thread; returns at once when called from inside one.
    pub(super) fn cancel(&self) {
        let first = !self.stopped.swap(true, Ordering::SeqCst);
        if first {
            let mut state = lock(&self.state);
            if *state != SubscriptionState::Errored {
                *state = SubscriptionState::Cancelled;
            }
        }

        let reentrant = DELIVERING.with(Cell::get) == self.address();
        if !reentrant {
            drop(lock(&self.delivery));
        }

        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
    }
}

/// Handle to a live history subscription.
///
/// Dropping the handle cancels the subscription, so keep it for as long as
/// updates are wanted.
#[must_use = "dropping the handle cancels the subscription"]
#[derive(Debug)]
pub struct HistoryHandle {
    subscription: Option<Arc<Subscription>>,
}

impl HistoryHandle {
    pub(super) fn active(subscription: Arc<Subscription>) -> Self {
        Self {
            subscription: Some(subscription),
        }
    }

    pub(super) fn idle() -> Self {
        Self { subscription: None }
    }

    /// Release the subscription.
    ///
    /// Once this returns no further `on_update` call begins, including one
    /// whose snapshot was already in flight. Safe to call from inside a
    /// callback and more than once.
    pub fn cancel(&self) {
        if let Some(subscription) = &self.subscription {
            subscription.cancel();
        }
    }

    /// Current lifecycle state. Handles returned for "no identity" stay
    /// [`SubscriptionState::Idle`].
    pub fn state(&self) -> SubscriptionState {
        self.subscription
            .as_ref()
            .map_or(SubscriptionState::Idle, |subscription| subscription.state())
    }
}

impl Drop for HistoryHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
