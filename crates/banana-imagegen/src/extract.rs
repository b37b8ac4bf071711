//! Locate the image payload in a provider response and normalize its encoding
//!
//! Providers deliver image data as raw bytes, base64 text, or base64 text
//! that was itself base64-encoded again somewhere upstream. Whatever comes
//! in, what leaves this module is raw image bytes.

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
};

use crate::{
    format::{ImageFormat, hex_preview},
    response::{InlinePayload, Payload, RawPart, RawProviderResponse},
    result::{ErrorKind, Failure},
};

/// How the payload was encoded on arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEncoding {
    /// Already raw image bytes
    Raw,
    /// One layer of base64
    Base64,
    /// Two layers of base64
    DoubleBase64,
    /// Decoded once without a recognizable signature; validation decides
    Unverified,
}

/// Image bytes pulled out of a provider response
#[derive(Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// Raw bytes, never base64 text
    pub bytes: Vec<u8>,
    /// MIME type the provider claimed, if any
    pub claimed_mime_type: Option<String>,
    pub encoding: PayloadEncoding,
}

impl std::fmt::Debug for ExtractedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractedImage")
            .field("bytes", &self.bytes.len())
            .field("claimed_mime_type", &self.claimed_mime_type)
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// Pull the first usable image out of a provider response
///
/// A safety signal anywhere in the response wins over any payload that
/// may also be present.
///
/// # Errors
///
/// Returns a `SafetyBlocked` failure if the provider withheld the image
/// and an `ImageExtractionFailed` failure if no decodable payload exists
pub fn extract(response: RawProviderResponse) -> Result<ExtractedImage, Failure> {
    if let Some(reason) = response.block_reason {
        return Err(Failure::new(
            ErrorKind::SafetyBlocked,
            format!("prompt blocked by provider ({reason})"),
        ));
    }

    if let Some(reason) = response
        .candidates
        .iter()
        .filter_map(|c| c.finish_reason.as_ref())
        .find(|r| r.is_safety())
    {
        return Err(Failure::new(
            ErrorKind::SafetyBlocked,
            "image withheld by provider safety filter",
        )
        .with_detail(format!("{reason:?}")));
    }

    let mut text = None;
    let mut payload = None;
    for part in response.candidates.into_iter().flat_map(|c| c.parts) {
        match part {
            RawPart::Inline(inline) if !inline.data.is_empty() => {
                payload = Some(inline);
                break;
            }
            RawPart::Text(t) if text.is_none() && !t.trim().is_empty() => text = Some(t),
            RawPart::Inline(_) | RawPart::Text(_) => {}
        }
    }

    let Some(InlinePayload { data, mime_type }) = payload else {
        let failure = Failure::new(ErrorKind::ImageExtractionFailed, "provider response contains no image data");
        return Err(match text {
            Some(text) => failure.with_detail(format!("model replied with text only: {text}")),
            None => failure,
        });
    };

    let is_text = matches!(data, Payload::Text(_));
    let bytes = data.into_bytes();

    let (bytes, encoding) = match decode_payload(&bytes) {
        Some(decoded) => decoded,
        None if is_text => {
            return Err(Failure::new(
                ErrorKind::ImageExtractionFailed,
                "provider returned image data that is not valid base64",
            )
            .with_detail(format!("len {}, head {}", bytes.len(), hex_preview(&bytes))));
        }
        None => (bytes, PayloadEncoding::Unverified),
    };

    match encoding {
        PayloadEncoding::DoubleBase64 => {
            tracing::warn!(len = bytes.len(), "payload was base64-encoded twice, recovered");
        }
        PayloadEncoding::Unverified => {
            tracing::warn!(
                len = bytes.len(),
                head = %hex_preview(&bytes),
                "decoded payload has no known signature, deferring to validation"
            );
        }
        PayloadEncoding::Raw | PayloadEncoding::Base64 => {
            tracing::debug!(len = bytes.len(), ?encoding, "extracted image payload");
        }
    }

    Ok(ExtractedImage {
        bytes,
        claimed_mime_type: mime_type,
        encoding,
    })
}

/// Raw, then single base64, then double base64, then best-effort single decode
fn decode_payload(data: &[u8]) -> Option<(Vec<u8>, PayloadEncoding)> {
    if ImageFormat::from_magic(data).is_some() {
        return Some((data.to_vec(), PayloadEncoding::Raw));
    }

    let once = decode_base64(data)?;
    if ImageFormat::from_magic(&once).is_some() {
        return Some((once, PayloadEncoding::Base64));
    }

    if let Some(twice) = decode_base64(&once)
        && ImageFormat::from_magic(&twice).is_some()
    {
        return Some((twice, PayloadEncoding::DoubleBase64));
    }

    Some((once, PayloadEncoding::Unverified))
}

/// Decode base64 in any of the common alphabets, ignoring line breaks and
/// a leading `data:` URL header
fn decode_base64(data: &[u8]) -> Option<Vec<u8>> {
    let data = strip_data_url(data);
    let cleaned: Vec<u8> = data.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();

    if cleaned.is_empty() || !cleaned.iter().all(|&b| is_base64_byte(b)) {
        return None;
    }

    [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(&cleaned).ok())
        .filter(|decoded| !decoded.is_empty())
}

fn strip_data_url(data: &[u8]) -> &[u8] {
    const MARKER: &[u8] = b";base64,";

    if !data.starts_with(b"data:") {
        return data;
    }

    data.windows(MARKER.len())
        .position(|window| window == MARKER)
        .map_or(data, |at| &data[at + MARKER.len()..])
}

const fn is_base64_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'-' | b'_' | b'=')
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use base64::Engine as _;
    use tracing_subscriber::{
        Layer,
        layer::{Context, SubscriberExt},
    };

    use super::*;
    use crate::{
        fixtures,
        response::{FinishReason, RawCandidate},
    };

    fn response_with(part: RawPart) -> RawProviderResponse {
        RawProviderResponse {
            candidates: vec![RawCandidate {
                finish_reason: Some(FinishReason::Stop),
                parts: vec![part],
            }],
            block_reason: None,
        }
    }

    fn inline(data: Payload, mime_type: &str) -> RawPart {
        RawPart::Inline(InlinePayload {
            data,
            mime_type: Some(mime_type.to_string()),
        })
    }

    #[test]
    fn single_base64_jpeg() {
        let jpeg = fixtures::jpeg(16, 16);
        let response = response_with(inline(Payload::Text(STANDARD.encode(&jpeg)), "image/jpeg"));

        let extracted = extract(response).unwrap();
        assert_eq!(extracted.encoding, PayloadEncoding::Base64);
        assert_eq!(extracted.bytes, jpeg);
        assert_eq!(extracted.claimed_mime_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn double_base64_png() {
        let png = fixtures::png(16, 16);
        let twice = STANDARD.encode(STANDARD.encode(&png));
        let response = response_with(inline(Payload::Text(twice), "image/png"));

        let extracted = extract(response).unwrap();
        assert_eq!(extracted.encoding, PayloadEncoding::DoubleBase64);
        assert_eq!(extracted.bytes, png);
    }

    #[test]
    fn double_base64_jpeg_arrives_as_binary() {
        let jpeg = fixtures::jpeg(16, 16);
        // Base64 text of "/9j/..." starts with "Lzlq"
        let twice = STANDARD.encode(STANDARD.encode(&jpeg));
        assert!(twice.starts_with("Lzlq"));

        let response = response_with(inline(Payload::Binary(twice.into_bytes()), "image/jpeg"));
        let extracted = extract(response).unwrap();
        assert_eq!(extracted.encoding, PayloadEncoding::DoubleBase64);
        assert_eq!(extracted.bytes, jpeg);
    }

    #[test]
    fn raw_png_passes_through() {
        let png = fixtures::png(16, 16);
        let response = response_with(inline(Payload::Binary(png.clone()), "image/png"));

        let extracted = extract(response).unwrap();
        assert_eq!(extracted.encoding, PayloadEncoding::Raw);
        assert_eq!(extracted.bytes, png);
    }

    #[test]
    fn jpeg_signature_in_base64_text() {
        let response = response_with(inline(Payload::Text("/9j/4AAQSkZJRgABAQ==".to_string()), "image/png"));

        let extracted = extract(response).unwrap();
        assert_eq!(extracted.encoding, PayloadEncoding::Base64);
        assert_eq!(ImageFormat::from_magic(&extracted.bytes), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn wrapped_and_url_safe_base64() {
        let jpeg = fixtures::jpeg(16, 16);
        let wrapped: String = STANDARD
            .encode(&jpeg)
            .as_bytes()
            .chunks(76)
            .map(|line| format!("{}\n", String::from_utf8_lossy(line)))
            .collect();
        assert_eq!(extract(response_with(inline(Payload::Text(wrapped), "image/jpeg"))).unwrap().bytes, jpeg);

        let url_safe = URL_SAFE_NO_PAD.encode(&jpeg);
        assert_eq!(extract(response_with(inline(Payload::Text(url_safe), "image/jpeg"))).unwrap().bytes, jpeg);
    }

    #[test]
    fn data_url_header_is_ignored() {
        let png = fixtures::png(8, 8);
        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(&png));

        let extracted = extract(response_with(inline(Payload::Text(data_url), "image/png"))).unwrap();
        assert_eq!(extracted.bytes, png);
    }

    #[test]
    fn safety_wins_over_payload() {
        let png = fixtures::png(16, 16);
        let response = RawProviderResponse {
            candidates: vec![RawCandidate {
                finish_reason: Some(FinishReason::from_gemini("IMAGE_SAFETY")),
                parts: vec![inline(Payload::Binary(png), "image/png")],
            }],
            block_reason: None,
        };

        let failure = extract(response).unwrap_err();
        assert_eq!(failure.kind, ErrorKind::SafetyBlocked);
        assert!(!failure.retryable);
    }

    #[test]
    fn blocked_prompt_is_safety() {
        let response = RawProviderResponse {
            candidates: vec![],
            block_reason: Some("PROHIBITED_CONTENT".to_string()),
        };

        assert_eq!(extract(response).unwrap_err().kind, ErrorKind::SafetyBlocked);
    }

    #[test]
    fn text_only_response_fails_extraction() {
        let response = response_with(RawPart::Text("I cannot draw that.".to_string()));

        let failure = extract(response).unwrap_err();
        assert_eq!(failure.kind, ErrorKind::ImageExtractionFailed);
        assert!(failure.detail.unwrap().contains("I cannot draw that."));
    }

    #[test]
    fn empty_inline_is_skipped() {
        let png = fixtures::png(8, 8);
        let response = RawProviderResponse {
            candidates: vec![RawCandidate {
                finish_reason: None,
                parts: vec![
                    RawPart::Text("here you go".to_string()),
                    inline(Payload::Text(String::new()), "image/png"),
                    inline(Payload::Binary(png.clone()), "image/png"),
                ],
            }],
            block_reason: None,
        };

        assert_eq!(extract(response).unwrap().bytes, png);
    }

    #[test]
    fn no_candidates_fails_extraction() {
        let failure = extract(RawProviderResponse::default()).unwrap_err();
        assert_eq!(failure.kind, ErrorKind::ImageExtractionFailed);
    }

    #[test]
    fn non_base64_text_fails_extraction() {
        let response = response_with(inline(Payload::Text("not an image!".to_string()), "image/png"));
        assert_eq!(extract(response).unwrap_err().kind, ErrorKind::ImageExtractionFailed);
    }

    #[test]
    fn unsignatured_base64_is_unverified() {
        let response = response_with(inline(Payload::Text(STANDARD.encode([0x42u8; 200])), "image/png"));

        let extracted = extract(response).unwrap();
        assert_eq!(extracted.encoding, PayloadEncoding::Unverified);
        assert_eq!(extracted.bytes, vec![0x42; 200]);
    }

    /// Counts `WARN` events
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn unsignatured_binary_warns_once() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));
        let response = response_with(inline(Payload::Binary(vec![0xAB; 300]), "image/png"));

        let extracted = tracing::subscriber::with_default(subscriber, || extract(response)).unwrap();

        assert_eq!(extracted.encoding, PayloadEncoding::Unverified);
        assert_eq!(extracted.bytes, vec![0xAB; 300]);
        assert_eq!(warnings.load(Ordering::SeqCst), 1);
    }
}
