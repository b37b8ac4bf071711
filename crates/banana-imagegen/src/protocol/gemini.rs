//! Gemini `generateContent` wire format

use serde::{Deserialize, Serialize};

use crate::{
    response::{FinishReason, InlinePayload, Payload, RawCandidate, RawPart, RawProviderResponse},
    types::Modality,
};

// -- Request types --

/// Gemini `generateContent` request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    pub generation_config: GeminiGenerationConfig,
}

/// Content object containing role and parts
#[derive(Debug, Clone, Serialize)]
pub struct GeminiContent {
    /// Role ("user")
    pub role: &'static str,
    pub parts: Vec<GeminiPart>,
}

/// Request part
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GeminiPart {
    Text(String),
    InlineData(GeminiInlineData),
}

/// Inline binary data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiInlineData {
    /// MIME type (e.g. "image/png")
    #[serde(default, alias = "mime_type")]
    pub mime_type: Option<String>,
    /// Base64-encoded data
    #[serde(default)]
    pub data: String,
}

/// Generation configuration parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    pub response_modalities: Vec<Modality>,
    pub candidate_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<GeminiImageConfig>,
}

/// Image output options
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<&'static str>,
    /// Resolution tier ("1K", "2K", "4K")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<&'static str>,
}

// -- Response types --

/// Gemini `generateContent` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    pub prompt_feedback: Option<GeminiPromptFeedback>,
}

/// Generated candidate
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    /// Missing when the candidate was filtered before any content was produced
    #[serde(default)]
    pub content: Option<GeminiResponseContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeminiResponseContent {
    #[serde(default)]
    pub parts: Vec<GeminiResponsePart>,
}

/// Response part; unknown part kinds deserialize with every field empty
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "inline_data")]
    pub inline_data: Option<GeminiInlineData>,
    /// Thought summaries from thinking models
    #[serde(default)]
    pub thought: Option<bool>,
}

/// Prompt-level feedback
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl From<GeminiResponse> for RawProviderResponse {
    fn from(response: GeminiResponse) -> Self {
        let block_reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .filter(|reason| !reason.is_empty() && reason != "BLOCK_REASON_UNSPECIFIED");

        let candidates = response
            .candidates
            .into_iter()
            .map(|candidate| RawCandidate {
                finish_reason: candidate.finish_reason.as_deref().map(FinishReason::from_gemini),
                parts: candidate
                    .content
                    .map(|content| content.parts)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|part| part.thought != Some(true))
                    .filter_map(|part| match (part.inline_data, part.text) {
                        (Some(inline), _) => Some(RawPart::Inline(InlinePayload {
                            data: Payload::Text(inline.data),
                            mime_type: inline.mime_type,
                        })),
                        (None, Some(text)) => Some(RawPart::Text(text)),
                        (None, None) => None,
                    })
                    .collect(),
            })
            .collect();

        Self {
            candidates,
            block_reason,
        }
    }
}
