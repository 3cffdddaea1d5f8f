//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **gemini**: reqwest client for the Gemini `generateContent` API, used
//!   for photo analysis and daily summaries.
//! - **memory**: in-process scan store and anonymous identity provider.
//!
//! Adapters are thin translators between domain types and vendor
//! representations. They contain no business logic.

pub mod gemini;
pub mod memory;
