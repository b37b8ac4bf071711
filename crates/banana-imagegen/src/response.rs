//! Provider-neutral response envelope
//!
//! Adapters unwrap their wire format into these types without touching
//! the payload encoding; the extractor takes it from there.

use std::fmt;

/// Outermost response of a provider call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProviderResponse {
    /// Generated candidates, in provider order
    pub candidates: Vec<RawCandidate>,
    /// Request-level rejection (e.g. the prompt itself was blocked)
    pub block_reason: Option<String>,
}

/// One generated candidate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCandidate {
    pub finish_reason: Option<FinishReason>,
    pub parts: Vec<RawPart>,
}

/// Why a provider stopped generating a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Normal completion
    Stop,
    /// Withheld on content-policy grounds; carries the provider's reason
    Safety(String),
    /// Anything else (token limit, recitation, ...)
    Other(String),
}

impl FinishReason {
    /// Interpret a Gemini `finishReason` value
    pub fn from_gemini(reason: &str) -> Self {
        match reason {
            "STOP" => Self::Stop,
            "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII" | "IMAGE_SAFETY" | "IMAGE_PROHIBITED_CONTENT" => {
                Self::Safety(reason.to_string())
            }
            other => Self::Other(other.to_string()),
        }
    }

    pub const fn is_safety(&self) -> bool {
        matches!(self, Self::Safety(_))
    }
}

/// A single content part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPart {
    Text(String),
    Inline(InlinePayload),
}

/// Inline data with its provider-claimed MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePayload {
    pub data: Payload,
    pub mime_type: Option<String>,
}

/// Payload exactly as the provider delivered it
#[derive(Clone, PartialEq, Eq)]
pub enum Payload {
    /// Byte sequence: raw image data or base64 text in bytes
    Binary(Vec<u8>),
    /// Text, usually base64 (possibly twice)
    Text(String),
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Binary(bytes) => bytes.is_empty(),
            Self::Text(text) => text.is_empty(),
        }
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Binary(bytes) => bytes,
            Self::Text(text) => text.into_bytes(),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(bytes) => write!(f, "Binary({} bytes)", bytes.len()),
            Self::Text(text) => write!(f, "Text({} chars)", text.len()),
        }
    }
}
