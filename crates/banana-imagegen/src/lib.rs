#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod classify;
mod descriptor;
mod dispatch;
mod error;
mod extract;
mod format;
mod handler;
mod http_client;
mod normalize;
mod optimize;
mod protocol;
mod provider;
mod response;
mod result;
mod retry;
mod types;
mod validate;

#[cfg(test)]
mod fixtures;

use std::sync::Arc;

pub use classify::classify;
pub use descriptor::{GEMINI_2_5_FLASH_IMAGE, GEMINI_3_PRO_IMAGE, IMAGEN_4_ULTRA, ProviderDescriptor};
pub use dispatch::{Dispatcher, DispatcherBuilder};
pub use error::{ImageGenError, ProviderError, Result};
pub use extract::{ExtractedImage, PayloadEncoding, extract};
pub use format::{DetectedFormat, DetectionSource, ImageFormat, MIN_IMAGE_LEN, detect_format};
pub use handler::{ImageRequest, OptimizeRequest, WireReferenceImage, endpoint_router};
pub use http_client::build_http_client;
pub use normalize::{TEMPERATURE_RANGE, normalize};
pub use optimize::{OptimizedPrompt, PromptOptimizer};
pub use provider::{GeminiAdapter, ImagenAdapter, ProviderAdapter};
pub use response::{FinishReason, InlinePayload, Payload, RawCandidate, RawPart, RawProviderResponse};
pub use result::{ErrorKind, Failure, GeneratedImage, GenerationResult};
pub use retry::RetryPolicy;
pub use types::{AspectRatio, GenerationInput, GenerationRequest, Modality, ReferenceImage, Resolution};
pub use validate::{Dimensions, validate_image};

/// Build the generation dispatcher from configuration
///
/// # Errors
///
/// Returns an error if a provider cannot be initialized
pub fn build_dispatcher(config: &banana_config::Config) -> anyhow::Result<Arc<Dispatcher>> {
    let dispatcher = Arc::new(
        Dispatcher::from_config(config)
            .map_err(|e| anyhow::anyhow!("Failed to initialize image generation dispatcher: {e}"))?,
    );
    Ok(dispatcher)
}
