// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Worker configuration
//!
//! Route conventions are fixed for one application's API; the defaults here
//! are the production values and most deployments never override them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Reserved path prefix for application API traffic
pub const DEFAULT_API_PREFIX: &str = "/pump/api/";

/// Name of the cache store opened at startup
pub const DEFAULT_CACHE_NAME: &str = "sw_cache";

/// Result code for a successful API call
pub const SUCCESS_CODE: &str = "0";

/// Result code the backend uses for an invalid or expired session
pub const AUTH_FAILURE_CODE: &str = "E0001";

/// Path matching rule for protected endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "path", rename_all = "snake_case")]
pub enum RouteRule {
    /// Path ends with the given suffix
    EndsWith(String),
    /// Path contains the given segment anywhere
    Contains(String),
}

impl RouteRule {
    pub fn ends_with(path: impl Into<String>) -> Self {
        RouteRule::EndsWith(path.into())
    }

    pub fn contains(path: impl Into<String>) -> Self {
        RouteRule::Contains(path.into())
    }

    /// Check a URL path against this rule
    pub fn matches(&self, path: &str) -> bool {
        match self {
            RouteRule::EndsWith(suffix) => path.ends_with(suffix.as_str()),
            RouteRule::Contains(segment) => path.contains(segment.as_str()),
        }
    }
}

/// Worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Reserved API prefix separating API calls from pages and assets
    pub api_prefix: String,
    /// Cache store name
    pub cache_name: String,
    /// Header carrying the session token
    pub auth_header: String,
    /// Login endpoint suffix
    pub login_path: String,
    /// User profile endpoint suffix
    pub user_path: String,
    /// Result code meaning success
    pub success_code: String,
    /// Result code meaning the session is no longer valid
    pub auth_failure_code: String,
    /// User account endpoints
    pub user_routes: Vec<RouteRule>,
    /// Governance (vote/DAO) endpoints
    pub governance_routes: Vec<RouteRule>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            auth_header: "Authorization".to_string(),
            login_path: "/login".to_string(),
            user_path: "/user".to_string(),
            success_code: SUCCESS_CODE.to_string(),
            auth_failure_code: AUTH_FAILURE_CODE.to_string(),
            user_routes: vec![
                RouteRule::ends_with("/login"),
                RouteRule::contains("/my-asset/"),
                RouteRule::ends_with("/user"),
            ],
            governance_routes: vec![
                RouteRule::ends_with("/vote/daos"),
                RouteRule::ends_with("/vote/dao/detail"),
                RouteRule::ends_with("/vote/dao/apply"),
                RouteRule::contains("/vote/my/"),
                RouteRule::contains("/vote/last/claim"),
            ],
        }
    }
}

impl WorkerConfig {
    /// Create a new worker config
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from JSON; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Set API prefix
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Set cache name
    pub fn cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    /// Set the auth failure code
    pub fn auth_failure_code(mut self, code: impl Into<String>) -> Self {
        self.auth_failure_code = code.into();
        self
    }

    /// Add a user endpoint rule
    pub fn user_route(mut self, rule: RouteRule) -> Self {
        self.user_routes.push(rule);
        self
    }

    /// Add a governance endpoint rule
    pub fn governance_route(mut self, rule: RouteRule) -> Self {
        self.governance_routes.push(rule);
        self
    }

    /// Check the config for values that would make every checker misfire
    pub fn validate(&self) -> Result<()> {
        if !self.api_prefix.starts_with('/') {
            return Err(Error::config(format!(
                "api_prefix must start with '/': {}",
                self.api_prefix
            )));
        }
        if self.auth_header.trim().is_empty() {
            return Err(Error::config("auth_header must not be empty"));
        }
        if reqwest::header::HeaderName::from_bytes(self.auth_header.as_bytes()).is_err() {
            return Err(Error::config(format!(
                "auth_header is not a valid header name: {}",
                self.auth_header
            )));
        }
        if self.success_code == self.auth_failure_code {
            return Err(Error::config(
                "success_code and auth_failure_code must differ",
            ));
        }
        Ok(())
    }

    /// Path is inside the API prefix
    pub fn is_api_path(&self, path: &str) -> bool {
        path.starts_with(self.api_prefix.as_str())
    }

    /// Path is a user endpoint
    pub fn is_user_route(&self, path: &str) -> bool {
        self.user_routes.iter().any(|r| r.matches(path))
    }

    /// Path is a governance endpoint
    pub fn is_governance_route(&self, path: &str) -> bool {
        self.governance_routes.iter().any(|r| r.matches(path))
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// User agent string
    pub user_agent: String,
    /// Optional overall timeout; none by default, the abort signal is the only bound
    pub timeout: Option<std::time::Duration>,
    /// Default headers
    pub default_headers: Vec<(String, String)>,
    /// Proxy URL
    pub proxy: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: crate::http::DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            default_headers: vec![],
            proxy: None,
        }
    }
}

impl HttpClientConfig {
    /// Create a new client config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Add default header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }
}
