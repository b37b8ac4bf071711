use std::path::Path;

use crate::{Config, ProviderType};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no providers are configured, the retry budget
    /// is empty, or a provider, proxy or prompt optimizer entry is invalid
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_has_providers()?;
        self.validate_retry_config()?;
        self.validate_http_config()?;
        self.validate_provider_config()?;
        self.validate_prompt_optimizer_config()?;
        Ok(())
    }

    /// Ensure at least one provider is configured
    fn validate_has_providers(&self) -> anyhow::Result<()> {
        if self.providers.is_empty() {
            anyhow::bail!("at least one image generation provider must be configured under [providers]");
        }

        Ok(())
    }

    fn validate_retry_config(&self) -> anyhow::Result<()> {
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }

        Ok(())
    }

    fn validate_http_config(&self) -> anyhow::Result<()> {
        if let Some(proxy) = self.http.proxy_url() {
            url::Url::parse(proxy).map_err(|e| anyhow::anyhow!("invalid http.proxy '{proxy}': {e}"))?;
        }

        Ok(())
    }

    /// Validate per-provider settings
    fn validate_provider_config(&self) -> anyhow::Result<()> {
        for (mode, provider) in &self.providers {
            if mode.trim().is_empty() {
                anyhow::bail!("provider mode names must not be empty");
            }

            if provider.model.trim().is_empty() {
                anyhow::bail!("provider '{mode}' must declare a model");
            }

            if let Some(ref base_url) = provider.base_url {
                url::Url::parse(base_url)
                    .map_err(|e| anyhow::anyhow!("invalid base_url for provider '{mode}': {e}"))?;
            }

            if provider.provider_type == ProviderType::Imagen
                && provider.max_reference_images.is_some_and(|max| max > 0)
            {
                anyhow::bail!("provider '{mode}' is an imagen provider and cannot accept reference images");
            }
        }

        Ok(())
    }

    fn validate_prompt_optimizer_config(&self) -> anyhow::Result<()> {
        let Some(ref optimizer) = self.prompt_optimizer else {
            return Ok(());
        };

        if optimizer.model.trim().is_empty() {
            anyhow::bail!("prompt_optimizer.model must not be empty");
        }

        if optimizer.max_words == 0 {
            anyhow::bail!("prompt_optimizer.max_words must be at least 1");
        }

        if let Some(ref base_url) = optimizer.base_url {
            url::Url::parse(base_url).map_err(|e| anyhow::anyhow!("invalid prompt_optimizer.base_url: {e}"))?;
        }

        Ok(())
    }
}
