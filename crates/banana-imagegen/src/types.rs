use std::{fmt, str::FromStr};

use serde::Serialize;

/// Aspect ratios understood by at least one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "2:3")]
    Portrait2x3,
    #[serde(rename = "3:2")]
    Landscape3x2,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "4:5")]
    Portrait4x5,
    #[serde(rename = "5:4")]
    Landscape5x4,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "21:9")]
    Ultrawide21x9,
}

impl AspectRatio {
    /// Wire representation (e.g. "16:9")
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait2x3 => "2:3",
            Self::Landscape3x2 => "3:2",
            Self::Portrait3x4 => "3:4",
            Self::Landscape4x3 => "4:3",
            Self::Portrait4x5 => "4:5",
            Self::Landscape5x4 => "5:4",
            Self::Portrait9x16 => "9:16",
            Self::Landscape16x9 => "16:9",
            Self::Ultrawide21x9 => "21:9",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ratio = match s.trim() {
            "1:1" => Self::Square,
            "2:3" => Self::Portrait2x3,
            "3:2" => Self::Landscape3x2,
            "3:4" => Self::Portrait3x4,
            "4:3" => Self::Landscape4x3,
            "4:5" => Self::Portrait4x5,
            "5:4" => Self::Landscape5x4,
            "9:16" => Self::Portrait9x16,
            "16:9" => Self::Landscape16x9,
            "21:9" => Self::Ultrawide21x9,
            other => return Err(format!("unsupported aspect ratio '{other}'")),
        };
        Ok(ratio)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output resolution tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Resolution {
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl Resolution {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1K" => Ok(Self::OneK),
            "2K" => Ok(Self::TwoK),
            "4K" => Ok(Self::FourK),
            _ => Err(format!("unsupported resolution '{s}'")),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output modality requested from a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Text,
    Image,
}

/// Reference image supplied by the caller
#[derive(Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    /// Raw image bytes
    pub data: Vec<u8>,
    /// Declared MIME type (e.g. "image/jpeg")
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }
}

impl fmt::Debug for ReferenceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceImage")
            .field("bytes", &self.data.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Generation request as received from the caller, before normalization
#[derive(Debug, Clone, Default)]
pub struct GenerationInput {
    /// Text description of the desired image
    pub prompt: String,
    /// Selects the provider (e.g. "banana", "banana_pro", "imagen")
    pub mode: String,
    /// Ordered reference images
    pub reference_images: Vec<ReferenceImage>,
    /// Requested aspect ratio; provider default when absent
    pub aspect_ratio: Option<String>,
    /// Requested resolution tier; provider default when absent
    pub resolution: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Send the prompt verbatim instead of wrapping it with reference guidance
    pub skip_optimization: bool,
}

/// Validated, provider-eligible generation request
///
/// Only produced by [`crate::normalize`], so every field already satisfies
/// the selected provider's descriptor.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub(crate) mode: String,
    pub(crate) prompt: String,
    pub(crate) reference_images: Vec<ReferenceImage>,
    pub(crate) aspect_ratio: Option<AspectRatio>,
    pub(crate) resolution: Option<Resolution>,
    pub(crate) temperature: Option<f32>,
    pub(crate) skip_optimization: bool,
}

impl GenerationRequest {
    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn reference_images(&self) -> &[ReferenceImage] {
        &self.reference_images
    }

    /// `None` means the provider's own default
    pub const fn aspect_ratio(&self) -> Option<AspectRatio> {
        self.aspect_ratio
    }

    /// `None` means the provider's own default
    pub const fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    pub const fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub const fn skip_optimization(&self) -> bool {
        self.skip_optimization
    }
}
