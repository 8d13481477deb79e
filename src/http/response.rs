// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP response types

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};

/// HTTP response representation
///
/// The body is reference counted, so `clone()` gives an independent reader
/// without exhausting the original.
#[derive(Debug, Clone)]
pub struct Response {
    /// Response status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
    /// Final URL, `None` for synthesized responses
    pub url: Option<Url>,
    body_used: bool,
}

impl Response {
    /// Create a new response
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes, url: Option<Url>) -> Self {
        Self {
            status,
            headers,
            body,
            url,
            body_used: false,
        }
    }

    /// Synthesize a plain-text response
    pub fn text_response(status: StatusCode, text: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain;charset=UTF-8"),
        );
        Self::new(status, headers, Bytes::from(text.into()), None)
    }

    /// Synthesize a JSON response
    pub fn json_response<T: serde::Serialize>(status: StatusCode, value: &T) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(status, headers, Bytes::from(body), None))
    }

    /// Status in 200..=299
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Get status code as u16
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Whether a reader already took the body
    pub fn body_used(&self) -> bool {
        self.body_used
    }

    /// Take the body, marking it consumed
    pub fn take_body(&mut self) -> Result<Bytes> {
        if self.body_used {
            return Err(Error::BodyUsed {
                url: self.url_str().to_string(),
            });
        }
        self.body_used = true;
        Ok(std::mem::take(&mut self.body))
    }

    /// Get body as text
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| Error::Other(e.to_string()))
    }

    /// Get body as text, lossy conversion
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Error::from)
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get content type
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the final URL as string, empty for synthesized responses
    pub fn url_str(&self) -> &str {
        self.url.as_ref().map(|u| u.as_str()).unwrap_or("")
    }

    /// Get body length
    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response() {
        let resp = Response::text_response(StatusCode::OK, "Intercepted by Blocker");
        assert!(resp.is_ok());
        assert_eq!(resp.text().unwrap(), "Intercepted by Blocker");
        assert_eq!(resp.content_type(), Some("text/plain;charset=UTF-8"));
        assert_eq!(resp.url_str(), "");
    }

    #[test]
    fn test_clone_is_independent_reader() {
        let mut resp = Response::text_response(StatusCode::OK, "hello");
        let reader = resp.clone();

        assert_eq!(resp.take_body().unwrap(), Bytes::from("hello"));
        assert!(resp.body_used());
        assert!(resp.take_body().is_err());

        assert!(!reader.body_used());
        assert_eq!(reader.text().unwrap(), "hello");
    }

    #[test]
    fn test_json_parse_error() {
        let resp = Response::text_response(StatusCode::OK, "not json");
        let parsed: Result<serde_json::Value> = resp.json();
        assert!(matches!(parsed, Err(Error::Serialization(_))));
    }
}
