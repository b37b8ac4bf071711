//! Mode registry and the end-to-end generation pipeline

use std::sync::Arc;

use banana_config::{Config, ProviderType};
use indexmap::IndexMap;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    descriptor::ProviderDescriptor,
    error::{ImageGenError, Result},
    extract::{ExtractedImage, extract},
    format::detect_format,
    http_client::build_http_client,
    normalize::normalize,
    optimize::{OptimizedPrompt, PromptOptimizer},
    provider::{GeminiAdapter, ImagenAdapter, ProviderAdapter},
    result::{ErrorKind, Failure, GeneratedImage, GenerationResult},
    retry::RetryPolicy,
    types::GenerationInput,
    validate::validate_image,
};

struct RegisteredProvider {
    descriptor: ProviderDescriptor,
    adapter: Arc<dyn ProviderAdapter>,
}

/// Routes generation requests to the provider registered for their mode
///
/// Immutable after construction and shared across concurrent requests.
pub struct Dispatcher {
    providers: IndexMap<String, RegisteredProvider>,
    retry: RetryPolicy,
    optimizer: Option<PromptOptimizer>,
}

impl Dispatcher {
    pub fn builder(retry: RetryPolicy) -> DispatcherBuilder {
        DispatcherBuilder {
            providers: IndexMap::new(),
            retry,
            optimizer: None,
        }
    }

    /// Build the registry, one adapter per configured mode, over a single
    /// pooled HTTP client
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_http_client(&config.http)?;
        let retry = RetryPolicy::from_config(&config.retry);
        let mut builder = Self::builder(retry);

        if let Some(optimizer_config) = &config.prompt_optimizer {
            tracing::debug!(model = %optimizer_config.model, "registering prompt optimizer");
            builder = builder.optimizer(PromptOptimizer::new(client.clone(), optimizer_config, retry));
        }

        for (mode, provider_config) in &config.providers {
            tracing::debug!(mode = %mode, model = %provider_config.model, "registering image generation provider");

            let mut descriptor = ProviderDescriptor::builtin(provider_config.provider_type, &provider_config.model);
            if let Some(max) = provider_config.max_reference_images {
                descriptor = descriptor.with_max_reference_images(max)?;
            }

            let adapter: Arc<dyn ProviderAdapter> = match provider_config.provider_type {
                ProviderType::Gemini => Arc::new(GeminiAdapter::new(
                    mode.clone(),
                    client.clone(),
                    provider_config,
                    descriptor.clone(),
                )),
                ProviderType::Imagen => Arc::new(ImagenAdapter::new(
                    mode.clone(),
                    client.clone(),
                    provider_config,
                    descriptor.clone(),
                )),
            };

            builder = builder.register(mode.clone(), descriptor, adapter);
        }

        if builder.providers.is_empty() {
            return Err(ImageGenError::ConfigError(
                "no image generation providers configured".to_string(),
            ));
        }

        let dispatcher = builder.build();
        tracing::debug!(
            "image generation dispatcher initialized with {} provider(s)",
            dispatcher.providers.len()
        );

        Ok(dispatcher)
    }

    /// Capabilities of the provider behind `mode`
    pub fn descriptor(&self, mode: &str) -> Option<&ProviderDescriptor> {
        self.providers.get(mode).map(|p| &p.descriptor)
    }

    /// Registered modes in configuration order
    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Mode used when a request names none: the first one configured
    pub fn default_mode(&self) -> Option<&str> {
        self.modes().next()
    }

    /// Rewrite a prompt with the configured text model
    ///
    /// Upstream failures fall back to the original prompt; only a missing
    /// optimizer or an empty prompt is an error.
    pub async fn optimize_prompt(&self, prompt: &str) -> std::result::Result<OptimizedPrompt, Failure> {
        let Some(optimizer) = &self.optimizer else {
            return Err(Failure::new(ErrorKind::Configuration, "prompt optimizer is not configured"));
        };

        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(Failure::validation("prompt must not be empty"));
        }

        Ok(optimizer.optimize(prompt).await)
    }

    /// Run one request through the whole pipeline
    ///
    /// Never fails: every outcome, including an unknown mode, comes back
    /// as a [`GenerationResult`].
    pub async fn generate(&self, input: GenerationInput) -> GenerationResult {
        let span = tracing::info_span!("generate", request_id = %Uuid::new_v4(), mode = %input.mode);

        async move {
            let outcome = self.run(input).await;

            match &outcome {
                Ok(image) => tracing::info!(
                    format = image.format.as_str(),
                    width = image.width,
                    height = image.height,
                    bytes = image.bytes.len(),
                    "image generated"
                ),
                Err(failure) => tracing::warn!(
                    kind = %failure.kind,
                    retryable = failure.retryable,
                    detail = failure.detail.as_deref().unwrap_or_default(),
                    "image generation failed: {}",
                    failure.message
                ),
            }

            GenerationResult::from(outcome)
        }
        .instrument(span)
        .await
    }

    async fn run(&self, input: GenerationInput) -> std::result::Result<GeneratedImage, Failure> {
        let Some(provider) = self.providers.get(&input.mode) else {
            return Err(Failure::new(
                ErrorKind::Configuration,
                format!("unknown mode '{}'", input.mode),
            ));
        };

        let mut request = normalize(input, &provider.descriptor)?;

        if let Some(optimizer) = &self.optimizer
            && optimizer.runs_before_generation()
            && !request.skip_optimization
        {
            request.prompt = optimizer.optimize(&request.prompt).await.optimized_prompt;
        }

        let raw = self
            .retry
            .run(|attempt| {
                tracing::debug!(provider = provider.adapter.name(), attempt, "calling provider");
                provider.adapter.call(&request)
            })
            .await?;

        // Base64 passes and image decoding over multi-megabyte payloads are CPU-bound
        tokio::task::spawn_blocking(move || extract(raw).and_then(finish))
            .await
            .map_err(|e| Failure::new(ErrorKind::Unknown, "image validation did not complete").with_detail(e.to_string()))?
    }
}

/// Detect, validate and assemble
fn finish(extracted: ExtractedImage) -> std::result::Result<GeneratedImage, Failure> {
    let ExtractedImage {
        bytes,
        claimed_mime_type,
        encoding,
    } = extracted;

    let detected = detect_format(&bytes, claimed_mime_type.as_deref())?;
    let dimensions = validate_image(&bytes, &detected)?;

    tracing::debug!(?encoding, source = ?detected.source, "image validated");

    Ok(GeneratedImage {
        mime_type: detected.format.mime_type().to_string(),
        format: detected.format,
        width: dimensions.width,
        height: dimensions.height,
        bytes,
    })
}

/// Registers adapters by mode
pub struct DispatcherBuilder {
    providers: IndexMap<String, RegisteredProvider>,
    retry: RetryPolicy,
    optimizer: Option<PromptOptimizer>,
}

impl DispatcherBuilder {
    /// Register `adapter` under `mode`; a later registration replaces an earlier one
    #[must_use]
    pub fn register(
        mut self,
        mode: impl Into<String>,
        descriptor: ProviderDescriptor,
        adapter: Arc<dyn ProviderAdapter>,
    ) -> Self {
        self.providers
            .insert(mode.into(), RegisteredProvider { descriptor, adapter });
        self
    }

    /// Rewrite prompts with `optimizer` on request, and before generation if it is set to
    #[must_use]
    pub fn optimizer(mut self, optimizer: PromptOptimizer) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            providers: self.providers,
            retry: self.retry,
            optimizer: self.optimizer,
        }
    }
}
