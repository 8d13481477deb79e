// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client implementation

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use super::request::Request;
use super::response::Response;
use crate::config::HttpClientConfig;
use crate::error::{Error, Result};

/// Network transport used by the orchestrator
///
/// `HttpClient` is the production implementation; tests swap in in-memory
/// transports.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the network round trip for a request
    async fn fetch(&self, request: Request) -> Result<Response>;
}

/// HTTP client over reqwest
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| Error::config(format!("Invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| Error::config(format!("Invalid header value: {}", e)))?;
            default_headers.insert(name, value);
        }

        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(default_headers);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(ref proxy_url) = config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?,
            );
        }

        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Execute a request
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());

        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        tracing::debug!(url = %final_url, status = %status, "Network response");

        Ok(Response::new(status, headers, body, Some(final_url)))
    }

    /// Get client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn fetch(&self, request: Request) -> Result<Response> {
        self.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::DEFAULT_USER_AGENT;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new().unwrap();
        assert_eq!(client.config().user_agent, DEFAULT_USER_AGENT);
        assert!(client.config().timeout.is_none());
    }

    #[test]
    fn test_invalid_default_header() {
        let config = HttpClientConfig::new().header("bad header", "x");
        assert!(matches!(
            HttpClient::with_config(config),
            Err(Error::Config(_))
        ));
    }
}
