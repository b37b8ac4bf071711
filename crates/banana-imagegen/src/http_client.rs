use std::time::Duration;

use axum::http;
use banana_config::HttpConfig;
use reqwest::Client;

use crate::error::{ImageGenError, Result};

/// Build the pooled client shared by every provider adapter
///
/// Connections to the provider host are kept alive and reused across
/// requests. The configured proxy, if any, applies to all traffic;
/// without one, proxy environment variables are ignored.
pub fn build_http_client(config: &HttpConfig) -> Result<Client> {
    let mut headers = http::HeaderMap::new();
    headers.insert(http::header::CONNECTION, http::HeaderValue::from_static("keep-alive"));

    let mut builder = Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .pool_idle_timeout(Some(config.pool_idle_timeout))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .default_headers(headers);

    if let Some(proxy) = config.proxy_url() {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| ImageGenError::HttpClient(format!("invalid proxy '{proxy}': {e}")))?;
        builder = builder.proxy(proxy);
        tracing::debug!("outbound provider traffic routed through proxy");
    } else {
        builder = builder.no_proxy();
    }

    builder.build().map_err(|e| ImageGenError::HttpClient(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_defaults() {
        assert!(build_http_client(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn builds_with_proxy() {
        let config = HttpConfig {
            proxy: Some("http://127.0.0.1:29290".to_string()),
            ..HttpConfig::default()
        };
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn rejects_malformed_proxy() {
        let config = HttpConfig {
            proxy: Some("::not a url::".to_string()),
            ..HttpConfig::default()
        };
        let err = build_http_client(&config).unwrap_err();
        assert!(err.to_string().contains("invalid proxy"));
    }
}
