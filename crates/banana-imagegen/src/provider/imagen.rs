//! Imagen text-to-image via `predict`

use async_trait::async_trait;
use banana_config::ProviderConfig;
use reqwest::Client;
use secrecy::SecretString;

use super::{DEFAULT_BASE_URL, ProviderAdapter, model_url, post_json};
use crate::{
    descriptor::ProviderDescriptor,
    error::ProviderError,
    protocol::imagen::{ImagenInstance, ImagenParameters, ImagenRequest, ImagenResponse, OUTPUT_MIME_TYPE},
    response::RawProviderResponse,
    types::GenerationRequest,
};

/// Imagen provider; prompt only, no reference images
pub struct ImagenAdapter {
    name: String,
    client: Client,
    base_url: String,
    api_key: SecretString,
    descriptor: ProviderDescriptor,
}

impl ImagenAdapter {
    pub fn new(name: impl Into<String>, client: Client, config: &ProviderConfig, descriptor: ProviderDescriptor) -> Self {
        Self {
            name: name.into(),
            client,
            base_url: config.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: config.api_key.clone(),
            descriptor,
        }
    }

    fn build_request(request: &GenerationRequest) -> ImagenRequest {
        ImagenRequest {
            instances: vec![ImagenInstance {
                prompt: request.prompt().to_string(),
            }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: request.aspect_ratio().map(|r| r.as_str()),
                sample_image_size: request.resolution().map(|r| r.as_str()),
                output_mime_type: OUTPUT_MIME_TYPE,
            },
        }
    }
}

#[async_trait]
impl ProviderAdapter for ImagenAdapter {
    async fn call(&self, request: &GenerationRequest) -> Result<RawProviderResponse, ProviderError> {
        let body = Self::build_request(request);
        let url = model_url(&self.base_url, &self.descriptor.id, "predict");

        tracing::debug!(provider = %self.name, model = %self.descriptor.id, "calling imagen");

        let response: ImagenResponse = post_json(&self.client, &self.name, &url, &self.api_key, &body).await?;
        Ok(response.into())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
