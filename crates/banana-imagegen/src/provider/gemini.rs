//! Gemini image generation via `generateContent`

use async_trait::async_trait;
use banana_config::ProviderConfig;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use secrecy::SecretString;

use super::{DEFAULT_BASE_URL, ProviderAdapter, model_url, post_json};
use crate::{
    descriptor::ProviderDescriptor,
    error::ProviderError,
    protocol::gemini::{
        GeminiContent, GeminiGenerationConfig, GeminiImageConfig, GeminiInlineData, GeminiPart, GeminiRequest,
        GeminiResponse,
    },
    response::RawProviderResponse,
    types::GenerationRequest,
};

/// Phrases that already ask the model for an image
const IMAGE_KEYWORDS: &[&str] = &[
    "generate an image",
    "create an image",
    "draw",
    "picture of",
    "image of",
    "photo of",
    "illustration of",
];

/// Gemini provider
pub struct GeminiAdapter {
    name: String,
    client: Client,
    base_url: String,
    api_key: SecretString,
    descriptor: ProviderDescriptor,
}

impl GeminiAdapter {
    pub fn new(name: impl Into<String>, client: Client, config: &ProviderConfig, descriptor: ProviderDescriptor) -> Self {
        Self {
            name: name.into(),
            client,
            base_url: config.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: config.api_key.clone(),
            descriptor,
        }
    }

    fn build_request(&self, request: &GenerationRequest) -> GeminiRequest {
        let references = request.reference_images();
        let total = references.len();

        let prompt = if request.skip_optimization() {
            request.prompt().to_string()
        } else {
            enhance_prompt(request.prompt(), total)
        };

        let mut parts = Vec::with_capacity(1 + total * 2);
        parts.push(GeminiPart::Text(prompt));
        for (i, reference) in references.iter().enumerate() {
            parts.push(GeminiPart::InlineData(GeminiInlineData {
                mime_type: Some(reference.mime_type.clone()),
                data: STANDARD.encode(&reference.data),
            }));
            parts.push(GeminiPart::Text(format!("[Reference Image {} of {total}]", i + 1)));
        }

        let image_size = if self.descriptor.resolutions.is_empty() {
            None
        } else {
            request.resolution().map(|r| r.as_str())
        };
        let aspect_ratio = request.aspect_ratio().map(|r| r.as_str());

        let image_config = (aspect_ratio.is_some() || image_size.is_some()).then_some(GeminiImageConfig {
            aspect_ratio,
            image_size,
        });

        GeminiRequest {
            contents: vec![GeminiContent { role: "user", parts }],
            generation_config: GeminiGenerationConfig {
                response_modalities: self.descriptor.output_modalities.to_vec(),
                candidate_count: 1,
                temperature: request.temperature().or(self.descriptor.default_temperature),
                top_p: self.descriptor.default_top_p,
                top_k: None,
                image_config,
            },
        }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    async fn call(&self, request: &GenerationRequest) -> Result<RawProviderResponse, ProviderError> {
        let body = self.build_request(request);
        let url = model_url(&self.base_url, &self.descriptor.id, "generateContent");

        tracing::debug!(
            provider = %self.name,
            model = %self.descriptor.id,
            references = request.reference_images().len(),
            "calling gemini"
        );

        let response: GeminiResponse = post_json(&self.client, &self.name, &url, &self.api_key, &body).await?;
        Ok(response.into())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Make the image intent explicit and, with reference images, ask the model
/// to draw on every one of them
pub(crate) fn enhance_prompt(prompt: &str, reference_count: usize) -> String {
    let lower = prompt.to_lowercase();
    let prompt = if IMAGE_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
        prompt.to_string()
    } else {
        format!("Generate an image of {prompt}")
    };

    match reference_count {
        0 => prompt,
        1 => format!("{prompt}\n\nUse the reference image provided below. Keep its key details and produce a coherent, high-quality result."),
        n => format!(
            "{prompt}\n\nCombine all {n} reference images provided below. Every one of them must contribute to a single coherent, high-quality result."
        ),
    }
}
