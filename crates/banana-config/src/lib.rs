#![allow(clippy::must_use_candidate)]

mod env;
pub mod http;
mod loader;
pub mod prompt_optimizer;
pub mod providers;
pub mod retry;
pub mod server;
pub mod telemetry;

use std::time::Duration;

use serde::{Deserialize, Deserializer};

pub use http::*;
pub use prompt_optimizer::*;
pub use providers::*;
pub use retry::*;
pub use server::*;
pub use telemetry::*;

/// Top-level banana configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Shared outbound HTTP client
    #[serde(default)]
    pub http: HttpConfig,
    /// Retry policy for provider calls
    #[serde(default)]
    pub retry: RetryConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Image generation providers keyed by mode
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Optional model-backed prompt rewriting
    #[serde(default)]
    pub prompt_optimizer: Option<PromptOptimizerConfig>,
}

/// Parse a human-readable duration such as "2s", "10m" or "1h"
pub(crate) fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    duration_str::parse(&raw).map_err(|e| serde::de::Error::custom(format!("invalid duration '{raw}': {e}")))
}
