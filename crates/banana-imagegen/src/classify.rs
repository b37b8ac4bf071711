//! Map provider failures into the closed error taxonomy
//!
//! The HTTP status is the primary signal. Google's structured error body
//! (`{"error": {"code", "message", "status"}}`) refines it where the status
//! code alone is ambiguous, e.g. a 429 that is really an exhausted billing quota.

use serde::Deserialize;

use crate::{
    error::ProviderError,
    result::{ErrorKind, Failure},
};

/// Longest provider body kept in a failure's diagnostic detail
const MAX_DETAIL_LEN: usize = 2048;

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct GoogleErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Classify a provider failure
///
/// Pure and deterministic: the same error always yields the same kind.
pub fn classify(error: &ProviderError) -> Failure {
    match error {
        ProviderError::Timeout(message) => {
            Failure::new(ErrorKind::Timeout, "provider request timed out").with_detail(message.clone())
        }
        ProviderError::Network(message) => classify_transport(message),
        ProviderError::Status { status, body } => classify_status(*status, body),
        ProviderError::MalformedResponse(message) => {
            Failure::new(ErrorKind::Unknown, "provider returned an unexpected response")
                .with_detail(truncate(message))
        }
    }
}

fn classify_transport(message: &str) -> Failure {
    let lower = message.to_ascii_lowercase();

    let failure = if lower.contains("timed out") || lower.contains("timeout") {
        Failure::new(ErrorKind::Timeout, "provider request timed out")
    } else if lower.contains("proxy") {
        Failure::new(ErrorKind::ProxyOrNetwork, "could not reach provider through the configured proxy")
    } else {
        Failure::new(ErrorKind::ProxyOrNetwork, "could not reach provider")
    };

    failure.with_detail(message.to_string())
}

fn classify_status(status: u16, body: &str) -> Failure {
    let google = serde_json::from_str::<GoogleErrorEnvelope>(body)
        .map(|envelope| envelope.error)
        .unwrap_or_default();

    let text = if google.message.is_empty() {
        body.to_ascii_lowercase()
    } else {
        google.message.to_ascii_lowercase()
    };
    let mentions_quota = mentions_quota(&text);

    let (kind, message) = match status {
        408 | 504 => (ErrorKind::Timeout, "provider timed out"),
        429 if mentions_quota => (ErrorKind::Quota, "provider quota exhausted"),
        429 => (ErrorKind::RateLimited, "provider rate limit exceeded"),
        403 if mentions_quota => (ErrorKind::Quota, "provider quota exhausted"),
        401 | 403 => (ErrorKind::Auth, "provider rejected the API key"),
        400 if mentions_safety(&text) => (ErrorKind::SafetyBlocked, "request blocked by provider safety filter"),
        400 | 404 | 422 => (ErrorKind::Validation, "provider rejected the request"),
        500 | 502 | 503 => (ErrorKind::Unavailable, "provider temporarily unavailable"),
        _ => match google.status.as_str() {
            "RESOURCE_EXHAUSTED" => (ErrorKind::RateLimited, "provider rate limit exceeded"),
            "UNAVAILABLE" => (ErrorKind::Unavailable, "provider temporarily unavailable"),
            "DEADLINE_EXCEEDED" => (ErrorKind::Timeout, "provider timed out"),
            "UNAUTHENTICATED" | "PERMISSION_DENIED" => (ErrorKind::Auth, "provider rejected the API key"),
            _ => (ErrorKind::Unknown, "provider request failed"),
        },
    };

    let message = if google.message.is_empty() || kind == ErrorKind::Unknown {
        message.to_string()
    } else {
        format!("{message}: {}", google.message)
    };

    Failure::new(kind, message).with_detail(format!("status {status}: {}", truncate(body)))
}

fn mentions_quota(text: &str) -> bool {
    text.contains("quota") || text.contains("billing")
}

fn mentions_safety(text: &str) -> bool {
    text.contains("safety") || text.contains("blocked") || text.contains("prohibited")
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_DETAIL_LEN {
        return text.to_string();
    }

    let mut end = MAX_DETAIL_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
