//! Imagen `predict` wire format

use serde::{Deserialize, Serialize};

use crate::response::{FinishReason, InlinePayload, Payload, RawCandidate, RawPart, RawProviderResponse};

/// Output format requested from Imagen
pub const OUTPUT_MIME_TYPE: &str = "image/jpeg";

/// Imagen `predict` request
#[derive(Debug, Clone, Serialize)]
pub struct ImagenRequest {
    pub instances: Vec<ImagenInstance>,
    pub parameters: ImagenParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImagenInstance {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagenParameters {
    pub sample_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_image_size: Option<&'static str>,
    pub output_mime_type: &'static str,
}

/// Imagen `predict` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImagenResponse {
    #[serde(default)]
    pub predictions: Vec<ImagenPrediction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagenPrediction {
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Set when Responsible AI filtering withheld the image
    #[serde(default)]
    pub rai_filtered_reason: Option<String>,
}

impl From<ImagenResponse> for RawProviderResponse {
    fn from(response: ImagenResponse) -> Self {
        let candidates = response
            .predictions
            .into_iter()
            .map(|prediction| {
                let filtered = prediction.rai_filtered_reason.filter(|reason| !reason.is_empty());

                RawCandidate {
                    finish_reason: Some(filtered.map_or(FinishReason::Stop, FinishReason::Safety)),
                    parts: prediction
                        .bytes_base64_encoded
                        .map(|data| {
                            RawPart::Inline(InlinePayload {
                                data: Payload::Text(data),
                                mime_type: prediction.mime_type,
                            })
                        })
                        .into_iter()
                        .collect(),
                }
            })
            .collect();

        Self {
            candidates,
            block_reason: None,
        }
    }
}
