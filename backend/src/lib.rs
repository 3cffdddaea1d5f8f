//! NutriSnap backend: food photo analysis, live scan history and daily
//! nutrition summaries behind an actix-web API.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::{TRACE_ID_HEADER, Trace};
