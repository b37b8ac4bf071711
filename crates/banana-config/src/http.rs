use std::time::Duration;

use serde::Deserialize;

use crate::deserialize_duration;

/// Shared outbound HTTP client configuration
///
/// One pooled client is built from this and reused by every provider.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Total request timeout, matching the caller's own timeout
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    /// Connection establishment timeout
    #[serde(default = "default_connect_timeout", deserialize_with = "deserialize_duration")]
    pub connect_timeout: Duration,
    /// Maximum idle keep-alive connections per upstream host
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
    /// How long an idle keep-alive connection is retained
    #[serde(default = "default_pool_idle_timeout", deserialize_with = "deserialize_duration")]
    pub pool_idle_timeout: Duration,
    /// Proxy applied to all outbound traffic; empty means direct
    #[serde(default)]
    pub proxy: Option<String>,
}

impl HttpConfig {
    /// Proxy URL if one is configured and non-empty
    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            pool_idle_timeout: default_pool_idle_timeout(),
            proxy: None,
        }
    }
}

const fn default_timeout() -> Duration {
    Duration::from_secs(600)
}

const fn default_connect_timeout() -> Duration {
    Duration::from_secs(120)
}

const fn default_pool_max_idle_per_host() -> usize {
    50
}

const fn default_pool_idle_timeout() -> Duration {
    Duration::from_secs(3600)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let config: HttpConfig = toml::from_str("").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert_eq!(config.connect_timeout, Duration::from_secs(120));
        assert_eq!(config.pool_max_idle_per_host, 50);
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(3600));
        assert!(config.proxy_url().is_none());
    }

    #[test]
    fn human_readable_durations() {
        let toml = r#"
            timeout = "20m"
            connect_timeout = "30s"
            pool_idle_timeout = "5m"
        "#;

        let config: HttpConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(1200));
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(300));
    }

    #[test]
    fn invalid_duration_is_rejected() {
        assert!(toml::from_str::<HttpConfig>("timeout = \"soon\"").is_err());
    }

    #[test]
    fn empty_proxy_means_direct() {
        let config: HttpConfig = toml::from_str("proxy = \"  \"").unwrap();
        assert!(config.proxy_url().is_none());

        let config: HttpConfig = toml::from_str("proxy = \"http://127.0.0.1:29290\"").unwrap();
        assert_eq!(config.proxy_url(), Some("http://127.0.0.1:29290"));
    }
}
