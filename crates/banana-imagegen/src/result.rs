use std::fmt;

use banana_core::HttpError;
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::format::ImageFormat;

/// Closed taxonomy every pipeline failure is mapped into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad request from the caller
    Validation,
    /// Requested mode is not registered
    Configuration,
    Timeout,
    ProxyOrNetwork,
    RateLimited,
    Quota,
    Auth,
    /// Provider withheld the image on content-policy grounds
    SafetyBlocked,
    /// No usable payload in the provider response
    ImageExtractionFailed,
    /// Payload is not a decodable image
    InvalidImage,
    Unavailable,
    Unknown,
}

impl ErrorKind {
    /// Whether a provider call failing with this kind may be attempted again
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ProxyOrNetwork | Self::RateLimited | Self::Unavailable
        )
    }

    /// Stable snake-case code
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Configuration => "configuration",
            Self::Timeout => "timeout",
            Self::ProxyOrNetwork => "proxy_or_network",
            Self::RateLimited => "rate_limited",
            Self::Quota => "quota",
            Self::Auth => "auth",
            Self::SafetyBlocked => "safety_blocked",
            Self::ImageExtractionFailed => "image_extraction_failed",
            Self::InvalidImage => "invalid_image",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified failure of a generation request
///
/// `message` is safe to show to callers. `detail` carries raw diagnostics
/// for operators and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    #[serde(skip)]
    pub detail: Option<String>,
}

impl Failure {
    /// Create a failure whose retry eligibility follows its kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.is_retryable(),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }
}

impl HttpError for Failure {
    fn status_code(&self) -> StatusCode {
        match self.kind {
            ErrorKind::Validation | ErrorKind::SafetyBlocked => StatusCode::BAD_REQUEST,
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::Quota => StatusCode::PAYMENT_REQUIRED,
            ErrorKind::Configuration => StatusCode::NOT_FOUND,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::ImageExtractionFailed | ErrorKind::InvalidImage | ErrorKind::ProxyOrNetwork => {
                StatusCode::BAD_GATEWAY
            }
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        self.kind.as_str()
    }

    fn client_message(&self) -> String {
        self.message.clone()
    }
}

/// A validated image ready to stream back to the caller
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Raw image bytes, never base64 text
    pub bytes: Vec<u8>,
    /// MIME type matching `format`
    pub mime_type: String,
    /// Format confirmed from the bytes themselves
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl fmt::Debug for GeneratedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedImage")
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Canonical outcome of one generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Success(GeneratedImage),
    Failure(Failure),
}

impl GenerationResult {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(failure) => Some(failure),
            Self::Success(_) => None,
        }
    }

    /// Convert into a standard `Result`
    ///
    /// # Errors
    ///
    /// Returns the failure if the request did not succeed
    pub fn into_result(self) -> Result<GeneratedImage, Failure> {
        match self {
            Self::Success(image) => Ok(image),
            Self::Failure(failure) => Err(failure),
        }
    }
}

impl From<Result<GeneratedImage, Failure>> for GenerationResult {
    fn from(outcome: Result<GeneratedImage, Failure>) -> Self {
        match outcome {
            Ok(image) => Self::Success(image),
            Err(failure) => Self::Failure(failure),
        }
    }
}
