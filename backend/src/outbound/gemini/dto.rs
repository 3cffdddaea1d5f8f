//! Wire DTOs for the Gemini `generateContent` endpoint.
//!
//! Requests are built from domain inputs in one pass; responses are decoded
//! into these DTOs first and then mapped into domain values.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentRequest {
    pub(super) contents: Vec<ContentDto>,
    pub(super) generation_config: GenerationConfigDto,
}

#[derive(Debug, Serialize)]
pub(super) struct ContentDto {
    pub(super) role: &'static str,
    pub(super) parts: Vec<PartDto>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(super) enum PartDto {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataDto,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InlineDataDto {
    pub(super) mime_type: String,
    pub(super) data: String,
}

impl InlineDataDto {
    /// Split `data:<mime>;base64,<data>` into its parts.
    pub(super) fn from_data_uri(raw: &str) -> Result<Self, String> {
        let rest = raw
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| "photo must be a data URI".to_owned())?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| "data URI has no payload".to_owned())?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| "data URI must use base64 encoding".to_owned())?;
        if !mime_type.starts_with("image/") {
            return Err(format!("unsupported media type '{mime_type}'"));
        }
        if data.is_empty() {
            return Err("data URI payload is empty".to_owned());
        }
        Ok(Self {
            mime_type: mime_type.to_owned(),
            data: data.to_owned(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerationConfigDto {
    pub(super) response_mime_type: &'static str,
    pub(super) response_schema: Value,
}

impl GenerationConfigDto {
    /// Ask for a JSON object whose listed properties are all required strings.
    pub(super) fn json_object(properties: &[(&str, &str)]) -> Self {
        let schema_properties: serde_json::Map<String, Value> = properties
            .iter()
            .map(|(name, description)| {
                (
                    (*name).to_owned(),
                    json!({ "type": "STRING", "description": description }),
                )
            })
            .collect();
        let required: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();
        Self {
            response_mime_type: "application/json",
            response_schema: json!({
                "type": "OBJECT",
                "properties": schema_properties,
                "required": required,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentResponse {
    #[serde(default)]
    pub(super) candidates: Vec<CandidateDto>,
    pub(super) prompt_feedback: Option<PromptFeedbackDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CandidateDto {
    pub(super) content: Option<CandidateContentDto>,
    pub(super) finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CandidateContentDto {
    #[serde(default)]
    pub(super) parts: Vec<ResponsePartDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResponsePartDto {
    pub(super) text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PromptFeedbackDto {
    pub(super) block_reason: Option<String>,
}

const BLOCKING_FINISH_REASONS: [&str; 4] =
    ["SAFETY", "RECITATION", "PROHIBITED_CONTENT", "BLOCKLIST"];

/// Why a response carried no usable text.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum EmptyResponse {
    /// The prompt or candidate was blocked.
    Blocked(String),
    /// No candidate text was present.
    Missing,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    pub(super) fn first_text(self) -> Result<String, EmptyResponse> {
        if let Some(reason) = self.prompt_feedback.and_then(|feedback| feedback.block_reason) {
            return Err(EmptyResponse::Blocked(reason));
        }
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(EmptyResponse::Missing)?;
        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();
        if !text.trim().is_empty() {
            return Ok(text);
        }
        let finish_reason = candidate.finish_reason.unwrap_or_default();
        if BLOCKING_FINISH_REASONS.contains(&finish_reason.as_str()) {
            Err(EmptyResponse::Blocked(finish_reason))
        } else {
            Err(EmptyResponse::Missing)
        }
    }
}

/// Structured answer requested from the photo analysis prompt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FoodAnalysisDto {
    pub(super) food_name: String,
    pub(super) nutrition_information: String,
}

/// Structured answer requested from the daily summary prompt.
#[derive(Debug, Deserialize)]
pub(super) struct NutritionSummaryDto {
    pub(super) summary: String,
}
