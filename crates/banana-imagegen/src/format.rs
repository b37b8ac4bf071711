//! Image format detection from the bytes themselves

use serde::Serialize;

use crate::result::{ErrorKind, Failure};

/// Payloads shorter than this cannot be a real generated image
pub const MIN_IMAGE_LEN: usize = 100;

/// Image formats the pipeline can deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    /// File extension without the leading dot
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    /// Identify a format from its leading signature
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', ..] => Some(Self::Png),
            [b'G', b'I', b'F', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            _ => None,
        }
    }

    /// Interpret a MIME type such as "image/jpeg" or "image/jpg"
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        let essence = mime_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub(crate) const fn from_image_crate(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Gif => Some(Self::Gif),
            image::ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }

    pub(crate) const fn to_image_crate(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Gif => image::ImageFormat::Gif,
            Self::Webp => image::ImageFormat::WebP,
        }
    }
}

/// How the format was established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// The image decoder's sniffer recognized it
    Sniffed,
    /// Only the leading signature matched
    MagicBytes,
    /// Nothing matched; assumed PNG
    Defaulted,
}

/// Outcome of format detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedFormat {
    pub format: ImageFormat,
    pub source: DetectionSource,
    /// Provider-claimed MIME type when it disagrees with `format`
    pub claimed_mismatch: Option<String>,
}

/// Determine the true format of normalized image bytes
///
/// The sniffed format always wins over `claimed_mime_type`; a
/// disagreement is recorded and logged but never fails the request.
///
/// # Errors
///
/// Returns an `InvalidImage` failure if fewer than [`MIN_IMAGE_LEN`] bytes are given
pub fn detect_format(bytes: &[u8], claimed_mime_type: Option<&str>) -> Result<DetectedFormat, Failure> {
    if bytes.len() < MIN_IMAGE_LEN {
        return Err(Failure::new(
            ErrorKind::InvalidImage,
            format!("image data too short ({} bytes)", bytes.len()),
        )
        .with_detail(format!("head: {}", hex_preview(bytes))));
    }

    let (format, source) = if let Some(format) = image::guess_format(bytes).ok().and_then(ImageFormat::from_image_crate) {
        (format, DetectionSource::Sniffed)
    } else if let Some(format) = ImageFormat::from_magic(bytes) {
        (format, DetectionSource::MagicBytes)
    } else {
        tracing::warn!(head = %hex_preview(bytes), "image format not recognized, assuming png");
        (ImageFormat::Png, DetectionSource::Defaulted)
    };

    let claimed_mismatch = claimed_mime_type
        .filter(|claimed| ImageFormat::from_mime_type(claimed) != Some(format))
        .map(str::to_string);

    if let Some(ref claimed) = claimed_mismatch {
        tracing::warn!(
            claimed = %claimed,
            detected = format.mime_type(),
            "provider MIME type disagrees with image data, using detected format"
        );
    }

    Ok(DetectedFormat {
        format,
        source,
        claimed_mismatch,
    })
}

/// First 16 bytes as hex, for diagnostics
pub(crate) fn hex_preview(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().take(16).fold(String::with_capacity(32), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
