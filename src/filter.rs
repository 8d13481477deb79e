// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Ignore filters
//!
//! Cheap checks that run before the interceptor chain. A match means the
//! request is not API traffic and the fetch event is left to the platform.

use async_trait::async_trait;
use reqwest::Method;

use crate::http::Request;

/// Pre-filter deciding a request bypasses interception
#[async_trait]
pub trait IgnoreFilter: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// True when the request should be left alone
    async fn checker(&self, request: &Request) -> bool;
}

/// Static files and framework-internal requests
#[derive(Debug, Clone, Default)]
pub struct StaticAssetFilter;

impl StaticAssetFilter {
    /// Marker segment used by the frontend framework's internal requests
    pub const FRAMEWORK_MARKER: &'static str = "_nextjs_";

    /// Synchronous form of the check
    pub fn is_static(request: &Request) -> bool {
        if request.method != Method::GET {
            return false;
        }
        let path = request.path();
        path.contains('.')
            || path.ends_with("css")
            || path.ends_with("css2")
            || path.contains(Self::FRAMEWORK_MARKER)
            || path.split('/').filter(|s| !s.is_empty()).count() <= 1
    }
}

#[async_trait]
impl IgnoreFilter for StaticAssetFilter {
    fn name(&self) -> &str {
        "StaticAssetFilter"
    }

    async fn checker(&self, request: &Request) -> bool {
        Self::is_static(request)
    }
}

/// Page navigations and other GETs outside the API prefix
#[derive(Debug, Clone)]
pub struct PageFilter {
    api_prefix: String,
}

impl PageFilter {
    pub fn new(api_prefix: impl Into<String>) -> Self {
        Self {
            api_prefix: api_prefix.into(),
        }
    }
}

#[async_trait]
impl IgnoreFilter for PageFilter {
    fn name(&self) -> &str {
        "PageFilter"
    }

    async fn checker(&self, request: &Request) -> bool {
        request.method == Method::GET && !request.path().starts_with(self.api_prefix.as_str())
    }
}

/// Name of the first filter matching the request, if any
pub async fn first_match<'a>(
    filters: &'a [Box<dyn IgnoreFilter>],
    request: &Request,
) -> Option<&'a str> {
    for filter in filters {
        if filter.checker(request).await {
            return Some(filter.name());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_API_PREFIX;

    fn req(method: Method, path: &str) -> Request {
        Request::new(method, format!("https://app.test{}", path)).unwrap()
    }

    #[test]
    fn test_static_assets() {
        assert!(StaticAssetFilter::is_static(&req(Method::GET, "/logo.png")));
        assert!(StaticAssetFilter::is_static(&req(Method::GET, "/fonts/css2")));
        assert!(StaticAssetFilter::is_static(&req(Method::GET, "/theme/maincss")));
        assert!(StaticAssetFilter::is_static(&req(Method::GET, "/__nextjs_original-stack-frame")));
        assert!(StaticAssetFilter::is_static(&req(Method::GET, "/")));
        assert!(StaticAssetFilter::is_static(&req(Method::GET, "/market")));
        assert!(!StaticAssetFilter::is_static(&req(Method::GET, "/market/list")));
        assert!(!StaticAssetFilter::is_static(&req(Method::GET, "/pump/api/user")));
        assert!(!StaticAssetFilter::is_static(&req(Method::POST, "/upload/a.png")));
    }

    #[test]
    fn test_page_filter() {
        let filter = PageFilter::new(DEFAULT_API_PREFIX);

        assert!(tokio_test::block_on(filter.checker(&req(Method::GET, "/market/list"))));
        assert!(!tokio_test::block_on(filter.checker(&req(Method::GET, "/pump/api/user"))));
        assert!(!tokio_test::block_on(filter.checker(&req(Method::POST, "/market"))));
    }

    #[tokio::test]
    async fn test_first_match() {
        let filters: Vec<Box<dyn IgnoreFilter>> = vec![
            Box::new(StaticAssetFilter),
            Box::new(PageFilter::new(DEFAULT_API_PREFIX)),
        ];

        assert_eq!(first_match(&filters, &req(Method::GET, "/a.js")).await, Some("StaticAssetFilter"));
        assert_eq!(first_match(&filters, &req(Method::GET, "/home/feed")).await, Some("PageFilter"));
        assert_eq!(first_match(&filters, &req(Method::POST, "/pump/api/login")).await, None);
    }
}
