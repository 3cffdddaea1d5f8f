//! Gemini outbound adapter.
//!
//! One reqwest client implements both the `FoodAnalysisService` and the
//! `NutritionSummarizer` ports against the `generateContent` endpoint.

mod dto;
mod http_source;
mod prompt;

pub use http_source::{GeminiClientError, GeminiHttpClient, GeminiSettings};
