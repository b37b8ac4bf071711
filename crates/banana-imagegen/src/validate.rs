//! Full-decode integrity check

use crate::{
    format::{DetectedFormat, DetectionSource, hex_preview},
    result::{ErrorKind, Failure},
};

/// Pixel dimensions of a validated image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Decode the whole image to confirm it is intact
///
/// A recognized signature alone is not enough: truncated or corrupt
/// payloads still carry valid magic bytes.
///
/// # Errors
///
/// Returns an `InvalidImage` failure if the bytes do not decode
pub fn validate_image(bytes: &[u8], detected: &DetectedFormat) -> Result<Dimensions, Failure> {
    let decoded = match detected.source {
        DetectionSource::Defaulted => image::load_from_memory(bytes),
        DetectionSource::Sniffed | DetectionSource::MagicBytes => {
            image::load_from_memory_with_format(bytes, detected.format.to_image_crate())
        }
    };

    match decoded {
        Ok(image) => Ok(Dimensions {
            width: image.width(),
            height: image.height(),
        }),
        Err(e) => Err(Failure::new(
            ErrorKind::InvalidImage,
            format!("provider returned undecodable {} data", detected.format.as_str()),
        )
        .with_detail(format!("{e} (len {}, head {})", bytes.len(), hex_preview(bytes)))),
    }
}
