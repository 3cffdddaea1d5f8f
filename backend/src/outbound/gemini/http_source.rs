//! Reqwest-backed Gemini adapter.
//!
//! This adapter owns transport details only: splitting the photo data URI,
//! request serialisation, timeout and HTTP error mapping, and decoding the
//! model's JSON answer into domain values.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{
    ContentDto, EmptyResponse, FoodAnalysisDto, GenerateContentRequest, GenerateContentResponse,
    GenerationConfigDto, InlineDataDto, NutritionSummaryDto, PartDto,
};
use super::prompt::{daily_summary_prompt, food_analysis_prompt};
use crate::domain::ports::{
    FoodAnalysisError, FoodAnalysisService, NutritionSummarizer, NutritionSummarizerError,
};
use crate::domain::{AnalysisResult, FoodIntakeItem, ImagePayload, NutritionSummary};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// Base URL, e.g. `https://generativelanguage.googleapis.com`.
    pub endpoint: Url,
    /// Model name, e.g. `gemini-2.0-flash`.
    pub model: String,
    /// API key sent in the `x-goog-api-key` header.
    pub api_key: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Language requested for the nutrition description.
    pub nutrition_language: String,
}

/// Errors raised while building the adapter.
#[derive(Debug, thiserror::Error)]
pub enum GeminiClientError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    /// The endpoint and model did not form a valid URL.
    #[error("invalid Gemini endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    /// The model name was blank or contained a path separator.
    #[error("invalid Gemini model name '{0}'")]
    Model(String),
}

/// Gemini adapter implementing photo analysis and daily summaries.
pub struct GeminiHttpClient {
    client: Client,
    generate_url: Url,
    api_key: Zeroizing<String>,
    nutrition_language: String,
}

impl GeminiHttpClient {
    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the model name is invalid, the endpoint cannot be
    /// joined with the model path, or the reqwest client cannot be built.
    pub fn new(settings: GeminiSettings) -> Result<Self, GeminiClientError> {
        let generate_url = generate_content_url(&settings.endpoint, &settings.model)?;
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            generate_url,
            api_key: Zeroizing::new(settings.api_key),
            nutrition_language: settings.nutrition_language,
        })
    }

    async fn generate<T: DeserializeOwned>(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<T, CallError> {
        let response = self
            .client
            .post(self.generate_url.clone())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        debug!(bytes = body.len(), "gemini response received");
        decode_answer(body.as_ref())
    }
}

fn generate_content_url(endpoint: &Url, model: &str) -> Result<Url, GeminiClientError> {
    let model = model.trim();
    if model.is_empty() || model.contains('/') {
        return Err(GeminiClientError::Model(model.to_owned()));
    }
    let mut base = endpoint.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(&format!("v1beta/models/{model}:generateContent"))?)
}

#[async_trait]
impl FoodAnalysisService for GeminiHttpClient {
    async fn analyze(&self, image: &ImagePayload) -> Result<AnalysisResult, FoodAnalysisError> {
        let inline_data =
            InlineDataDto::from_data_uri(image.as_str()).map_err(FoodAnalysisError::invalid_request)?;
        let request = GenerateContentRequest {
            contents: vec![ContentDto {
                role: "user",
                parts: vec![
                    PartDto::Text {
                        text: food_analysis_prompt(&self.nutrition_language),
                    },
                    PartDto::InlineData { inline_data },
                ],
            }],
            generation_config: GenerationConfigDto::json_object(&[
                ("foodName", "Identified name of the food item."),
                (
                    "nutritionInformation",
                    "Detailed nutritional information, one fact per line.",
                ),
            ]),
        };

        let answer: FoodAnalysisDto = self.generate(&request).await?;
        AnalysisResult::new(answer.food_name, answer.nutrition_information)
            .map_err(|err| FoodAnalysisError::decode(err.to_string()))
    }
}

#[async_trait]
impl NutritionSummarizer for GeminiHttpClient {
    async fn summarize(
        &self,
        items: &[FoodIntakeItem],
    ) -> Result<NutritionSummary, NutritionSummarizerError> {
        let request = GenerateContentRequest {
            contents: vec![ContentDto {
                role: "user",
                parts: vec![PartDto::Text {
                    text: daily_summary_prompt(items),
                }],
            }],
            generation_config: GenerationConfigDto::json_object(&[(
                "summary",
                "Summary highlighting imbalances or areas for improvement.",
            )]),
        };

        let answer: NutritionSummaryDto = self.generate(&request).await?;
        Ok(NutritionSummary::new(answer.summary))
    }
}

/// Adapter-internal failure shared by both ports.
#[derive(Debug, PartialEq, Eq)]
enum CallError {
    Transport(String),
    Timeout(String),
    RateLimited(String),
    InvalidRequest(String),
    Decode(String),
    Blocked(String),
}

impl From<CallError> for FoodAnalysisError {
    fn from(error: CallError) -> Self {
        match error {
            CallError::Transport(message) => Self::transport(message),
            CallError::Timeout(message) => Self::timeout(message),
            CallError::RateLimited(message) => Self::rate_limited(message),
            CallError::InvalidRequest(message) => Self::invalid_request(message),
            CallError::Decode(message) => Self::decode(message),
            CallError::Blocked(message) => Self::rejected(message),
        }
    }
}

impl From<CallError> for NutritionSummarizerError {
    fn from(error: CallError) -> Self {
        match error {
            CallError::Transport(message) => Self::transport(message),
            CallError::Timeout(message) => Self::timeout(message),
            CallError::RateLimited(message) => Self::rate_limited(message),
            CallError::InvalidRequest(message) => Self::invalid_request(message),
            CallError::Decode(message) | CallError::Blocked(message) => Self::decode(message),
        }
    }
}

fn decode_answer<T: DeserializeOwned>(body: &[u8]) -> Result<T, CallError> {
    let response: GenerateContentResponse = serde_json::from_slice(body)
        .map_err(|error| CallError::Decode(format!("invalid Gemini JSON payload: {error}")))?;
    let text = response.first_text().map_err(|empty| match empty {
        EmptyResponse::Blocked(reason) => {
            CallError::Blocked(format!("model declined to answer ({reason})"))
        }
        EmptyResponse::Missing => CallError::Decode("model returned no answer".to_owned()),
    })?;
    serde_json::from_str(&text)
        .map_err(|error| CallError::Decode(format!("model answer did not match schema: {error}")))
}

fn map_transport_error(error: reqwest::Error) -> CallError {
    if error.is_timeout() {
        CallError::Timeout(error.to_string())
    } else {
        CallError::Transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CallError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => CallError::RateLimited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => CallError::Timeout(message),
        _ if status.is_client_error() => CallError::InvalidRequest(message),
        _ => CallError::Transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let mut chars = compact.chars();
    let preview: String = chars.by_ref().take(PREVIEW_CHAR_LIMIT).collect();
    if chars.next().is_some() {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
#[path = "http_source_tests.rs"]
mod tests;
