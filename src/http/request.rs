// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP request types and abort signal

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Result;

/// Cancellation signal carried by a request
///
/// Clones observe the same signal, so a rewritten request stays bound to the
/// page's original request.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    /// Create a fresh, unfired signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal
    pub fn abort(&self) {
        self.token.cancel();
    }

    /// Whether the signal has fired
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal fires
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }
}

/// Outbound HTTP request
///
/// Treated as immutable once dispatched; interceptors that change it build a
/// new value with [`Request::with_headers`].
#[derive(Debug, Clone)]
pub struct Request {
    /// Request method
    pub method: Method,
    /// Request URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Bytes>,
    /// Abort signal of the originating page request
    pub signal: AbortSignal,
}

impl Request {
    /// Create a new GET request
    pub fn get(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::GET, url)
    }

    /// Create a new POST request
    pub fn post(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::POST, url)
    }

    /// Create a new request with arbitrary method
    pub fn new(method: Method, url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            method,
            url: Url::parse(url.as_ref())?,
            headers: HeaderMap::new(),
            body: None,
            signal: AbortSignal::new(),
        })
    }

    /// Set a header
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Set the request body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Bind to an existing abort signal
    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = signal;
        self
    }

    /// New request with replaced headers; body and signal are shared
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        Self {
            method: self.method.clone(),
            url: self.url.clone(),
            headers,
            body: self.body.clone(),
            signal: self.signal.clone(),
        }
    }

    /// Get the URL as string
    pub fn url_str(&self) -> &str {
        self.url.as_str()
    }

    /// Get the URL path
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Header lookup by name, case-insensitive
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Whether a header is present
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }
}
