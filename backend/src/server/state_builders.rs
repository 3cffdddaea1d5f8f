//! Builders for the adapter states shared by every worker.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::{info, warn};

use nutrisnap::domain::ports::{
    FixtureFoodAnalysisService, FixtureNutritionSummarizer, FoodAnalysisService,
    NutritionSummarizer, ScanStore,
};
use nutrisnap::domain::{DailyNutritionService, ScanPipeline};
use nutrisnap::inbound::http::state::HttpState;
use nutrisnap::inbound::ws::state::WsState;
use nutrisnap::outbound::gemini::{GeminiHttpClient, GeminiSettings};
use nutrisnap::outbound::memory::InMemoryScanStore;

use super::ServerConfig;

/// States registered as app data on every worker.
#[derive(Clone)]
pub(super) struct AppStates {
    pub(super) http: web::Data<HttpState>,
    pub(super) ws: web::Data<WsState>,
}

type ModelPorts = (Arc<dyn FoodAnalysisService>, Arc<dyn NutritionSummarizer>);

fn build_model_ports(gemini: Option<&GeminiSettings>) -> std::io::Result<ModelPorts> {
    match gemini {
        Some(settings) => {
            let client = Arc::new(GeminiHttpClient::new(settings.clone()).map_err(|err| {
                std::io::Error::other(format!("Gemini client construction failed: {err}"))
            })?);
            info!(model = %settings.model, endpoint = %settings.endpoint, "using Gemini adapter");
            let analyzer: Arc<dyn FoodAnalysisService> = client.clone();
            let summarizer: Arc<dyn NutritionSummarizer> = client;
            Ok((analyzer, summarizer))
        }
        None => {
            warn!("no Gemini API key configured; answering with fixture data");
            let analyzer: Arc<dyn FoodAnalysisService> = Arc::new(FixtureFoodAnalysisService);
            let summarizer: Arc<dyn NutritionSummarizer> = Arc::new(FixtureNutritionSummarizer);
            Ok((analyzer, summarizer))
        }
    }
}

/// Wire the domain services over their adapters.
///
/// The scan store is shared so the history feed sees every stored scan.
///
/// # Errors
///
/// Returns [`std::io::Error`] when the Gemini client cannot be built.
pub(super) fn build_app_states(config: &ServerConfig) -> std::io::Result<AppStates> {
    let (analyzer, summarizer) = build_model_ports(config.gemini.as_ref())?;
    let store: Arc<dyn ScanStore> = Arc::new(InMemoryScanStore::new(Arc::new(DefaultClock)));

    let scans = Arc::new(ScanPipeline::new(analyzer, Arc::clone(&store)));
    let nutrition = Arc::new(DailyNutritionService::new(summarizer));

    Ok(AppStates {
        http: web::Data::new(HttpState::new(scans, nutrition)),
        ws: web::Data::new(WsState::new(store)),
    })
}
