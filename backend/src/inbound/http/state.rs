//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only see driving ports, so
//! tests can swap in mocks without any I/O.

use std::sync::Arc;

use crate::domain::ports::{DailyNutritionCommand, ScanCommand};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub scans: Arc<dyn ScanCommand>,
    pub nutrition: Arc<dyn DailyNutritionCommand>,
}

impl HttpState {
    /// Construct state from explicit port implementations.
    pub fn new(scans: Arc<dyn ScanCommand>, nutrition: Arc<dyn DailyNutritionCommand>) -> Self {
        Self { scans, nutrition }
    }
}
