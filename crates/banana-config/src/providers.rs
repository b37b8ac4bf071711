use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;

/// Provider configurations keyed by the mode string callers select them with
pub type ProvidersConfig = IndexMap<String, ProviderConfig>;

/// Configuration for a single image generation provider
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Backend family
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    /// Upstream model identifier (e.g. "gemini-3-pro-image-preview")
    pub model: String,
    /// API key
    pub api_key: SecretString,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<String>,
    /// Lower the model's built-in reference image limit
    #[serde(default)]
    pub max_reference_images: Option<usize>,
}

/// Supported image generation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Gemini `generateContent` with image output modalities
    Gemini,
    /// Imagen `predict`
    Imagen,
}
