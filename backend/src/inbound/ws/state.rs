//! Shared WebSocket adapter state.

use std::sync::Arc;

use crate::domain::HistorySynchronizer;
use crate::domain::ports::ScanStore;

/// Dependency bundle for the history feed.
#[derive(Clone)]
pub struct WsState {
    pub store: Arc<dyn ScanStore>,
}

impl WsState {
    /// Construct state over the scan store backing the feed.
    pub fn new(store: Arc<dyn ScanStore>) -> Self {
        Self { store }
    }

    /// A synchroniser owned by a single connection.
    pub fn synchronizer(&self) -> HistorySynchronizer {
        HistorySynchronizer::new(Arc::clone(&self.store))
    }
}
