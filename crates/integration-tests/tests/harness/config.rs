//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::time::Duration;

use banana_config::{Config, PromptOptimizerConfig, ProviderConfig, ProviderType, RetryConfig, ServerConfig};
use secrecy::SecretString;

pub const TEST_API_KEY: &str = "test-key";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults and near-instant retries
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: SocketAddr::from(([127, 0, 0, 1], 0)),
                },
                retry: RetryConfig {
                    max_attempts: 3,
                    base_delay: Duration::from_millis(5),
                },
                ..Config::default()
            },
        }
    }

    /// Add a Gemini provider pointed at a mock backend
    pub fn with_gemini(self, mode: &str, model: &str, base_url: &str) -> Self {
        self.with_provider(mode, ProviderType::Gemini, model, base_url)
    }

    /// Add an Imagen provider pointed at a mock backend
    pub fn with_imagen(self, mode: &str, model: &str, base_url: &str) -> Self {
        self.with_provider(mode, ProviderType::Imagen, model, base_url)
    }

    fn with_provider(mut self, mode: &str, provider_type: ProviderType, model: &str, base_url: &str) -> Self {
        self.config.providers.insert(
            mode.to_owned(),
            ProviderConfig {
                provider_type,
                model: model.to_owned(),
                api_key: SecretString::from(TEST_API_KEY),
                base_url: Some(base_url.to_owned()),
                max_reference_images: None,
            },
        );
        self
    }

    /// Lower a provider's reference image limit
    pub fn with_max_reference_images(mut self, mode: &str, max: usize) -> Self {
        if let Some(provider) = self.config.providers.get_mut(mode) {
            provider.max_reference_images = Some(max);
        }
        self
    }

    /// Add a prompt optimizer pointed at a mock backend
    pub fn with_prompt_optimizer(mut self, base_url: &str, before_generation: bool) -> Self {
        self.config.prompt_optimizer = Some(PromptOptimizerConfig {
            model: "gemini-2.0-flash".to_owned(),
            api_key: SecretString::from(TEST_API_KEY),
            base_url: Some(base_url.to_owned()),
            max_words: 150,
            before_generation,
        });
        self
    }

    /// Set total attempts per request
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.retry.max_attempts = max_attempts;
        self
    }

    /// Set the outbound request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.http.timeout = timeout;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
