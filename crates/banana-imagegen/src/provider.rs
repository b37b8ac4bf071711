pub(crate) mod gemini;
pub(crate) mod imagen;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};

use crate::{error::ProviderError, response::RawProviderResponse, types::GenerationRequest};

pub use gemini::GeminiAdapter;
pub use imagen::ImagenAdapter;

/// Default Google Generative Language API base URL
pub(crate) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One backend family's request/response translation
///
/// Implementations send exactly one upstream request per call and never
/// decode, classify, or retry; those belong to the pipeline.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Perform one generation call
    async fn call(&self, request: &GenerationRequest) -> Result<RawProviderResponse, ProviderError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// `{base}/models/{model}:{method}`
pub(crate) fn model_url(base_url: &str, model: &str, method: &str) -> String {
    format!("{}/models/{model}:{method}", base_url.trim_end_matches('/'))
}

/// POST a JSON body with Google API key auth and parse the JSON reply
pub(crate) async fn post_json<B, R>(
    client: &Client,
    provider: &str,
    url: &str,
    api_key: &SecretString,
    body: &B,
) -> Result<R, ProviderError>
where
    B: Serialize + Sync,
    R: DeserializeOwned,
{
    let response = client
        .post(url)
        .header("x-goog-api-key", api_key.expose_secret())
        .json(body)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(provider, error = %e, "upstream request failed");
            ProviderError::from(e)
        })?;

    let status = response.status();
    let bytes = response.bytes().await.map_err(ProviderError::from)?;

    if !status.is_success() {
        tracing::warn!(provider, status = %status, "upstream returned error");
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    tracing::debug!(provider, len = bytes.len(), "upstream response received");

    serde_json::from_slice(&bytes).map_err(|e| ProviderError::MalformedResponse(format!("failed to parse response: {e}")))
}
