use banana_config::ProviderType;

use crate::{
    error::{ImageGenError, Result},
    types::{AspectRatio, Modality, Resolution},
};

const GEMINI_ASPECT_RATIOS: &[AspectRatio] = &[
    AspectRatio::Square,
    AspectRatio::Portrait2x3,
    AspectRatio::Landscape3x2,
    AspectRatio::Portrait3x4,
    AspectRatio::Landscape4x3,
    AspectRatio::Portrait4x5,
    AspectRatio::Landscape5x4,
    AspectRatio::Portrait9x16,
    AspectRatio::Landscape16x9,
    AspectRatio::Ultrawide21x9,
];

const IMAGEN_ASPECT_RATIOS: &[AspectRatio] = &[
    AspectRatio::Square,
    AspectRatio::Portrait3x4,
    AspectRatio::Landscape4x3,
    AspectRatio::Portrait9x16,
    AspectRatio::Landscape16x9,
];

/// Gemini 3 Pro Image model id
pub const GEMINI_3_PRO_IMAGE: &str = "gemini-3-pro-image-preview";

/// Gemini 2.5 Flash Image model id
pub const GEMINI_2_5_FLASH_IMAGE: &str = "gemini-2.5-flash-image";

/// Imagen 4 Ultra model id
pub const IMAGEN_4_ULTRA: &str = "imagen-4.0-ultra-generate-001";

/// Static capabilities of a provider model
///
/// Built once at start-up and shared read-only by every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDescriptor {
    /// Upstream model id
    pub id: String,
    /// Backend family
    pub provider_type: ProviderType,
    /// Reference images beyond this count are dropped
    pub max_reference_images: usize,
    /// Accepted aspect ratios
    pub aspect_ratios: &'static [AspectRatio],
    /// Used when the caller's ratio is absent or unsupported; `None` leaves it to the provider
    pub default_aspect_ratio: Option<AspectRatio>,
    /// Accepted resolution tiers; empty when the model has a fixed output size
    pub resolutions: &'static [Resolution],
    /// Used when the caller's tier is absent or unsupported
    pub default_resolution: Option<Resolution>,
    /// Modalities requested in the response
    pub output_modalities: &'static [Modality],
    /// Sampling temperature when the caller gives none
    pub default_temperature: Option<f32>,
    /// Nucleus sampling threshold
    pub default_top_p: Option<f32>,
}

impl ProviderDescriptor {
    /// Descriptor for a configured model
    ///
    /// Unknown Gemini models get the 2.5 Flash capabilities; unknown
    /// Imagen models get the Imagen 4 capabilities.
    pub fn builtin(provider_type: ProviderType, model: &str) -> Self {
        match provider_type {
            ProviderType::Gemini if model.starts_with("gemini-3") && model.contains("image") => Self {
                id: model.to_string(),
                provider_type,
                max_reference_images: 14,
                aspect_ratios: GEMINI_ASPECT_RATIOS,
                default_aspect_ratio: None,
                resolutions: &[Resolution::OneK, Resolution::TwoK, Resolution::FourK],
                default_resolution: Some(Resolution::FourK),
                output_modalities: &[Modality::Text, Modality::Image],
                default_temperature: Some(0.4),
                default_top_p: Some(0.95),
            },
            ProviderType::Gemini => Self {
                id: model.to_string(),
                provider_type,
                max_reference_images: 3,
                aspect_ratios: GEMINI_ASPECT_RATIOS,
                default_aspect_ratio: None,
                resolutions: &[],
                default_resolution: None,
                output_modalities: &[Modality::Image],
                default_temperature: None,
                default_top_p: None,
            },
            ProviderType::Imagen => Self {
                id: model.to_string(),
                provider_type,
                max_reference_images: 0,
                aspect_ratios: IMAGEN_ASPECT_RATIOS,
                default_aspect_ratio: Some(AspectRatio::Square),
                resolutions: &[Resolution::OneK, Resolution::TwoK],
                default_resolution: Some(Resolution::TwoK),
                output_modalities: &[Modality::Image],
                default_temperature: None,
                default_top_p: None,
            },
        }
    }

    /// Lower the reference image limit
    ///
    /// # Errors
    ///
    /// Returns `ImageGenError::ConfigError` if `max` exceeds what the model supports
    pub fn with_max_reference_images(mut self, max: usize) -> Result<Self> {
        if max > self.max_reference_images {
            return Err(ImageGenError::ConfigError(format!(
                "model '{}' accepts at most {} reference images, {max} configured",
                self.id, self.max_reference_images
            )));
        }

        self.max_reference_images = max;
        Ok(self)
    }

    pub fn supports_aspect_ratio(&self, ratio: AspectRatio) -> bool {
        self.aspect_ratios.contains(&ratio)
    }

    pub fn supports_resolution(&self, resolution: Resolution) -> bool {
        self.resolutions.contains(&resolution)
    }
}
