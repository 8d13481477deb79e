// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Authorization interceptor
//!
//! Attaches the held session token to protected API calls and keeps the
//! token in step with login responses:
//!
//! - a login request drops the held token before dispatch
//! - a user-profile request that already carries a token seeds an empty store
//! - a successful login response stores `data.token`
//! - an auth-failure code on an authorized login call drops the token and
//!   tells every page the session is gone

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use serde::Deserialize;

use super::{Interceptor, PreHandle};
use crate::bridge::{GlobalMessage, MessageBridge};
use crate::config::WorkerConfig;
use crate::error::{Error, Result};
use crate::http::{Request, Response};
use crate::session::SessionStore;

/// Envelope every API endpoint answers with
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResult<T> {
    pub code: String,
    #[serde(default)]
    pub data: Option<T>,
}

/// Payload of a login response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub token: Option<String>,
}

/// Owns the session token's attach/harvest/invalidate lifecycle
pub struct AuthorizationInterceptor {
    config: Arc<WorkerConfig>,
    session: Arc<SessionStore>,
    bridge: Arc<MessageBridge>,
    header: HeaderName,
}

impl AuthorizationInterceptor {
    pub fn new(
        config: Arc<WorkerConfig>,
        session: Arc<SessionStore>,
        bridge: Arc<MessageBridge>,
    ) -> Result<Self> {
        let header = HeaderName::from_bytes(config.auth_header.as_bytes())
            .map_err(|e| Error::config(format!("Invalid auth header: {}", e)))?;
        Ok(Self {
            config,
            session,
            bridge,
            header,
        })
    }

    /// Shared session store
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn is_login(&self, request: &Request) -> bool {
        request.url_str().ends_with(self.config.login_path.as_str())
    }

    fn is_user_profile(&self, request: &Request) -> bool {
        request.url_str().ends_with(self.config.user_path.as_str())
    }

    fn carried_token<'a>(&self, request: &'a Request) -> Option<&'a str> {
        request.headers.get(&self.header).and_then(|v| v.to_str().ok())
    }

    /// Drop the session and tell every page
    fn invalidate_session(&self, request: &Request) {
        self.session.clear();
        let notified = self.bridge.broadcast(GlobalMessage::confirm_logout());
        tracing::info!(url = %request.url, notified, "session rejected by server, logged out");
    }
}

#[async_trait]
impl Interceptor for AuthorizationInterceptor {
    fn name(&self) -> &str {
        "AuthorizationInterceptor"
    }

    fn checker(&self, request: &Request) -> bool {
        let path = request.path();
        self.config.is_api_path(path)
            && (self.config.is_user_route(path) || self.config.is_governance_route(path))
    }

    async fn pre_handle(&self, request: &Request) -> PreHandle {
        tracing::debug!(url = %request.url, "authorization pre-handle");

        if self.is_login(request) {
            self.session.clear();
            return PreHandle::Continue;
        }

        let Some(token) = self.session.token() else {
            if self.is_user_profile(request) {
                if let Some(carried) = self.carried_token(request) {
                    self.session.set_token(carried);
                }
            }
            return PreHandle::Continue;
        };

        if request.headers.contains_key(&self.header) {
            return PreHandle::Continue;
        }

        match HeaderValue::from_str(&token) {
            Ok(value) => {
                let mut headers = request.headers.clone();
                headers.insert(self.header.clone(), value);
                PreHandle::Rewrite(request.with_headers(headers))
            }
            Err(e) => {
                tracing::warn!(error = %e, "held token is not a valid header value");
                PreHandle::Continue
            }
        }
    }

    fn handles_response(&self) -> bool {
        true
    }

    async fn post_handle(&self, request: &Request, response: Response) -> Result<Response> {
        let url = request.url_str();
        if !url.contains(self.config.api_prefix.as_str()) || !self.is_login(request) {
            return Ok(response);
        }
        if !response.is_ok() || response.body_used() {
            return Ok(response);
        }

        let reader = response.clone();
        let result: ApiResult<LoginData> = match reader.json() {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "unreadable login response");
                return Ok(response);
            }
        };

        if result.code == self.config.auth_failure_code && request.headers.contains_key(&self.header)
        {
            self.invalidate_session(request);
        }
        if result.code != self.config.success_code {
            return Ok(response);
        }

        match result.data.and_then(|d| d.token) {
            Some(token) => {
                tracing::info!("login succeeded, session token stored");
                self.session.set_token(token);
            }
            None => {
                tracing::warn!(url = %request.url, "login succeeded without a token");
                self.session.clear();
            }
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{ChannelClient, ClientRegistry};
    use reqwest::StatusCode;
    use tokio::sync::mpsc::UnboundedReceiver;

    const BASE: &str = "https://app.test/pump/api";

    struct Fixture {
        interceptor: AuthorizationInterceptor,
        session: Arc<SessionStore>,
        page: UnboundedReceiver<GlobalMessage>,
    }

    fn fixture() -> Fixture {
        let session = Arc::new(SessionStore::new());
        let registry = Arc::new(ClientRegistry::new());
        let (client, page) = ChannelClient::new("page");
        registry.register(Arc::new(client));
        let bridge = Arc::new(MessageBridge::new(registry, session.clone()));
        let interceptor =
            AuthorizationInterceptor::new(Arc::new(WorkerConfig::default()), session.clone(), bridge)
                .unwrap();
        Fixture {
            interceptor,
            session,
            page,
        }
    }

    fn get(path: &str) -> Request {
        Request::get(format!("{}{}", BASE, path)).unwrap()
    }

    fn json(body: serde_json::Value) -> Response {
        Response::json_response(StatusCode::OK, &body).unwrap()
    }

    #[test]
    fn test_checker() {
        let f = fixture();
        let i = &f.interceptor;

        assert!(i.checker(&get("/login")));
        assert!(i.checker(&get("/user")));
        assert!(i.checker(&get("/my-asset/balance")));
        assert!(i.checker(&get("/vote/daos")));
        assert!(i.checker(&get("/vote/my/history")));
        assert!(!i.checker(&get("/market/list")));
        assert!(!i.checker(&Request::get("https://app.test/other/login").unwrap()));
    }

    #[tokio::test]
    async fn test_login_clears_token() {
        let f = fixture();
        f.session.set_token("stale");

        let outcome = f.interceptor.pre_handle(&Request::post(format!("{}/login", BASE)).unwrap()).await;

        assert!(matches!(outcome, PreHandle::Continue));
        assert!(!f.session.has_token());
    }

    #[tokio::test]
    async fn test_injects_held_token() {
        let f = fixture();
        f.session.set_token("T");

        match f.interceptor.pre_handle(&get("/vote/daos")).await {
            PreHandle::Rewrite(req) => {
                assert_eq!(req.header_value("authorization"), Some("T"));
                assert_eq!(req.path(), "/pump/api/vote/daos");
            }
            other => panic!("expected Rewrite, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_existing_header_passes_through() {
        let f = fixture();
        f.session.set_token("T");

        let req = get("/my-asset/list").header("Authorization", "other");
        assert!(matches!(f.interceptor.pre_handle(&req).await, PreHandle::Continue));
        assert_eq!(f.session.token().as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn test_user_profile_seeds_empty_store() {
        let f = fixture();

        let req = get("/user").header("Authorization", "from-page");
        assert!(matches!(f.interceptor.pre_handle(&req).await, PreHandle::Continue));
        assert_eq!(f.session.token().as_deref(), Some("from-page"));
    }

    #[tokio::test]
    async fn test_no_token_passes_through() {
        let f = fixture();
        assert!(matches!(f.interceptor.pre_handle(&get("/vote/daos")).await, PreHandle::Continue));
        assert!(!f.session.has_token());
    }

    #[tokio::test]
    async fn test_carried_token_only_seeds_from_user_profile() {
        let f = fixture();

        for path in ["/vote/daos", "/my-asset/list", "/vote/my/history"] {
            let req = get(path).header("Authorization", "from-page");
            match f.interceptor.pre_handle(&req).await {
                PreHandle::Continue => {}
                other => panic!("expected Continue for {}, got {:?}", path, other),
            }
            assert!(!f.session.has_token(), "{} seeded the store", path);
        }
    }

    #[tokio::test]
    async fn test_harvest_token_on_login() {
        let f = fixture();
        let req = Request::post(format!("{}/login", BASE)).unwrap();
        let resp = json(serde_json::json!({"code": "0", "data": {"token": "abc", "walletAddress": "0x1"}}));

        let out = f.interceptor.post_handle(&req, resp).await.unwrap();

        assert_eq!(f.session.token().as_deref(), Some("abc"));
        assert!(!out.body_used());
    }

    #[tokio::test]
    async fn test_auth_failure_logs_out_once() {
        let mut f = fixture();
        f.session.set_token("T");
        let req = Request::post(format!("{}/login", BASE))
            .unwrap()
            .header("Authorization", "T");
        let resp = json(serde_json::json!({"code": "E0001", "data": null}));

        f.interceptor.post_handle(&req, resp).await.unwrap();

        assert!(!f.session.has_token());
        assert_eq!(f.page.try_recv().unwrap(), GlobalMessage::confirm_logout());
        assert!(f.page.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_auth_failure_without_header_keeps_token() {
        let mut f = fixture();
        f.session.set_token("T");
        let req = Request::post(format!("{}/login", BASE)).unwrap();
        let resp = json(serde_json::json!({"code": "E0001"}));

        f.interceptor.post_handle(&req, resp).await.unwrap();

        assert_eq!(f.session.token().as_deref(), Some("T"));
        assert!(f.page.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_other_failure_code_is_noop() {
        let f = fixture();
        f.session.set_token("T");
        let req = Request::post(format!("{}/login", BASE)).unwrap();
        let resp = json(serde_json::json!({"code": "E0002", "data": {"token": "x"}}));

        f.interceptor.post_handle(&req, resp).await.unwrap();
        assert_eq!(f.session.token().as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn test_post_handle_ignores_non_login_and_bad_bodies() {
        let f = fixture();

        let resp = json(serde_json::json!({"code": "0", "data": {"token": "x"}}));
        f.interceptor.post_handle(&get("/user"), resp).await.unwrap();
        assert!(!f.session.has_token());

        let login = Request::post(format!("{}/login", BASE)).unwrap();
        let garbage = Response::text_response(StatusCode::OK, "<html>");
        let out = f.interceptor.post_handle(&login, garbage).await.unwrap();
        assert_eq!(out.text().unwrap(), "<html>");

        let failed = Response::text_response(StatusCode::INTERNAL_SERVER_ERROR, "{}");
        f.interceptor.post_handle(&login, failed).await.unwrap();
        assert!(!f.session.has_token());
    }

    #[tokio::test]
    async fn test_consumed_body_is_left_alone() {
        let f = fixture();
        let login = Request::post(format!("{}/login", BASE)).unwrap();
        let mut resp = json(serde_json::json!({"code": "0", "data": {"token": "x"}}));
        resp.take_body().unwrap();

        f.interceptor.post_handle(&login, resp).await.unwrap();
        assert!(!f.session.has_token());
    }
}
