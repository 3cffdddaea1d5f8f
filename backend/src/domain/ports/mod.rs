//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod daily_nutrition_command;
mod food_analysis_service;
mod identity_provider;
mod nutrition_summarizer;
mod scan_command;
mod scan_store;

#[cfg(test)]
pub use daily_nutrition_command::MockDailyNutritionCommand;
pub use daily_nutrition_command::DailyNutritionCommand;
#[cfg(test)]
pub use food_analysis_service::MockFoodAnalysisService;
pub use food_analysis_service::{
    FIXTURE_FOOD_NAME, FixtureFoodAnalysisService, FoodAnalysisError, FoodAnalysisService,
};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{IdentityProvider, IdentityProviderError};
#[cfg(test)]
pub use nutrition_summarizer::MockNutritionSummarizer;
pub use nutrition_summarizer::{
    FixtureNutritionSummarizer, NutritionSummarizer, NutritionSummarizerError,
};
#[cfg(test)]
pub use scan_command::MockScanCommand;
pub use scan_command::{ScanCommand, SubmitScanRequest};
#[cfg(test)]
pub use scan_store::MockScanStore;
pub use scan_store::{FixtureScanStore, ScanSnapshotStream, ScanStore, ScanStoreError};
