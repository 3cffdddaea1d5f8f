//! Domain primitives, services and ports.
//!
//! Purpose: hold the scan pipeline, the live history synchroniser and the
//! daily nutrition service, independent of any transport or vendor. Adapters
//! plug in through the traits in [`ports`].
//!
//! Public surface:
//! - [`ScanPipeline`]: analyse a photo and store the result.
//! - [`HistorySynchronizer`]: push identity-scoped scan snapshots.
//! - [`DailyNutritionService`]: summarise a day's intake.
//! - [`Error`] / [`ErrorCode`]: transport-agnostic failure payload.

pub mod error;
pub mod history;
pub mod identity;
pub mod nutrition;
pub mod ports;
pub mod scan;
pub mod scan_outcome;
pub mod scan_pipeline;
pub mod trace_id;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::history::{
    ErrorCallback, FollowHandle, HistoryHandle, HistorySynchronizer, SubscriptionState,
    UpdateCallback,
};
pub use self::identity::{Identity, IdentityId, IdentityValidationError};
pub use self::nutrition::{
    DailyNutritionService, FoodIntakeDraft, FoodIntakeItem, FoodIntakeValidationError,
    NutritionSummary,
};
pub use self::scan::{
    AnalysisResult, AnalysisResultValidationError, EmptyImagePayload, ImagePayload,
    NewScanRecord, ScanOrder, ScanRecord, ScanRecordId,
};
pub use self::scan_outcome::{ScanError, ScanErrorKind, ScanOutcome};
pub use self::scan_pipeline::ScanPipeline;
pub use self::trace_id::TraceId;

/// Convenient result alias for driving ports.
pub type ApiResult<T> = Result<T, Error>;
