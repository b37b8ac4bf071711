use banana_core::HttpError;
use http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Errors raised while assembling the pipeline at start-up
#[derive(Debug, Error)]
pub enum ImageGenError {
    /// Provider configuration is inconsistent with the model's capabilities
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The shared HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl HttpError for ImageGenError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_type(&self) -> &str {
        match self {
            Self::ConfigError(_) => "configuration_error",
            Self::HttpClient(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        "image generation is not available".to_owned()
    }
}

/// Failure reported by a provider adapter
///
/// Adapters never classify or retry; they report what happened and the
/// classifier decides what it means.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The request did not complete within the client timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection, proxy, TLS or body-stream failure
    #[error("network error: {0}")]
    Network(String),

    /// Provider answered with a non-success status
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Provider answered 2xx with a body that does not follow the expected envelope
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        let message = error_chain(&error);

        if error.is_timeout() {
            Self::Timeout(message)
        } else if error.is_decode() {
            Self::MalformedResponse(message)
        } else {
            Self::Network(message)
        }
    }
}

/// Render an error with all of its sources
///
/// `reqwest` keeps the interesting part (proxy refused, DNS failure,
/// connection reset) in the source chain rather than the top-level message.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}
