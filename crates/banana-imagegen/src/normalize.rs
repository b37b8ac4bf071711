//! Inbound request validation and canonicalization

use std::ops::RangeInclusive;

use crate::{
    descriptor::ProviderDescriptor,
    result::Failure,
    types::{AspectRatio, GenerationInput, GenerationRequest, Resolution},
};

/// Accepted sampling temperature range
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=2.0;

/// Validate a caller's request against the selected provider
///
/// Runs before any network call. Excess reference images are dropped
/// (first N kept) and unsupported aspect ratios or resolutions fall back
/// to the provider default; only an empty prompt or an out-of-range
/// temperature is rejected.
///
/// # Errors
///
/// Returns a `Validation` failure for an empty prompt or invalid temperature
pub fn normalize(input: GenerationInput, descriptor: &ProviderDescriptor) -> Result<GenerationRequest, Failure> {
    let GenerationInput {
        prompt,
        mode,
        mut reference_images,
        aspect_ratio,
        resolution,
        temperature,
        skip_optimization,
    } = input;

    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(Failure::validation("prompt must not be empty"));
    }

    if let Some(value) = temperature
        && !TEMPERATURE_RANGE.contains(&value)
    {
        return Err(Failure::validation(format!(
            "temperature {value} is outside the accepted range {}..={}",
            TEMPERATURE_RANGE.start(),
            TEMPERATURE_RANGE.end()
        )));
    }

    if reference_images.len() > descriptor.max_reference_images {
        tracing::warn!(
            provider = %descriptor.id,
            received = reference_images.len(),
            kept = descriptor.max_reference_images,
            "dropping reference images beyond provider limit"
        );
        reference_images.truncate(descriptor.max_reference_images);
    }

    Ok(GenerationRequest {
        mode,
        prompt: prompt.to_string(),
        reference_images,
        aspect_ratio: resolve_aspect_ratio(aspect_ratio.as_deref(), descriptor),
        resolution: resolve_resolution(resolution.as_deref(), descriptor),
        temperature,
        skip_optimization,
    })
}

fn resolve_aspect_ratio(requested: Option<&str>, descriptor: &ProviderDescriptor) -> Option<AspectRatio> {
    let Some(raw) = requested.filter(|r| !r.trim().is_empty()) else {
        return descriptor.default_aspect_ratio;
    };

    match raw.parse::<AspectRatio>() {
        Ok(ratio) if descriptor.supports_aspect_ratio(ratio) => Some(ratio),
        _ => {
            tracing::warn!(
                provider = %descriptor.id,
                requested = %raw,
                fallback = ?descriptor.default_aspect_ratio,
                "unsupported aspect ratio, using provider default"
            );
            descriptor.default_aspect_ratio
        }
    }
}

fn resolve_resolution(requested: Option<&str>, descriptor: &ProviderDescriptor) -> Option<Resolution> {
    let Some(raw) = requested.filter(|r| !r.trim().is_empty()) else {
        return descriptor.default_resolution;
    };

    match raw.parse::<Resolution>() {
        Ok(resolution) if descriptor.supports_resolution(resolution) => Some(resolution),
        _ => {
            tracing::warn!(
                provider = %descriptor.id,
                requested = %raw,
                fallback = ?descriptor.default_resolution,
                "unsupported resolution, using provider default"
            );
            descriptor.default_resolution
        }
    }
}
