// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request interceptors
//!
//! An interceptor inspects requests its checker accepts, may rewrite or
//! short-circuit them, and may post-process the network response.

mod authorization;

pub use authorization::{ApiResult, AuthorizationInterceptor, LoginData};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::http::{Request, Response};

/// Outcome of pre-handling a request
#[derive(Debug, Clone)]
pub enum PreHandle {
    /// Dispatch this request instead; later interceptors are skipped
    Rewrite(Request),
    /// Fulfill with this response, no network call
    Respond(Response),
    /// Leave the request as is and offer it to the next interceptor
    Continue,
    /// Refuse the request; the page gets a synthesized response
    Block,
}

impl From<bool> for PreHandle {
    fn from(pass: bool) -> Self {
        if pass {
            PreHandle::Continue
        } else {
            PreHandle::Block
        }
    }
}

impl From<Request> for PreHandle {
    fn from(request: Request) -> Self {
        PreHandle::Rewrite(request)
    }
}

impl From<Response> for PreHandle {
    fn from(response: Response) -> Self {
        PreHandle::Respond(response)
    }
}

/// Pluggable request interceptor
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Name used in logs and block responses
    fn name(&self) -> &str;

    /// Whether this interceptor applies to the request
    fn checker(&self, request: &Request) -> bool;

    /// Called before the request is dispatched
    async fn pre_handle(&self, request: &Request) -> PreHandle;

    /// Whether [`Interceptor::post_handle`] should run at all
    fn handles_response(&self) -> bool {
        false
    }

    /// Called with the network response; returns the response to hand on
    async fn post_handle(&self, _request: &Request, response: Response) -> Result<Response> {
        Ok(response)
    }
}

/// Result of running the pre-handle pass
#[derive(Debug)]
pub enum ChainOutcome {
    /// No checker matched; the request was not touched
    Untouched,
    /// Dispatch this (possibly rewritten) request
    Forward(Request),
    /// Short-circuit with a response from an interceptor
    Respond(Response),
    /// An interceptor blocked the request
    Blocked { interceptor: String },
}

/// Interceptors in registration order
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    /// Create a new empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor
    pub fn add(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Builder form of [`InterceptorChain::add`]
    pub fn with(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.add(interceptor);
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Names of interceptors whose checker accepts the request
    pub fn matching(&self, request: &Request) -> Vec<&str> {
        self.interceptors
            .iter()
            .filter(|i| i.checker(request))
            .map(|i| i.name())
            .collect()
    }

    /// Offer the request to each matching interceptor in order
    pub async fn pre_handle(&self, request: Request) -> ChainOutcome {
        let mut request = request;
        let mut has_change = false;

        for interceptor in &self.interceptors {
            if !interceptor.checker(&request) {
                continue;
            }
            has_change = true;

            match interceptor.pre_handle(&request).await {
                PreHandle::Rewrite(rewritten) => {
                    request = rewritten;
                    break;
                }
                PreHandle::Respond(response) => return ChainOutcome::Respond(response),
                PreHandle::Block => {
                    return ChainOutcome::Blocked {
                        interceptor: interceptor.name().to_string(),
                    }
                }
                PreHandle::Continue => {}
            }
        }

        if has_change {
            ChainOutcome::Forward(request)
        } else {
            ChainOutcome::Untouched
        }
    }

    /// Thread the response through every matching post-handler
    ///
    /// Runs for every interceptor whose checker accepts `request`, including
    /// ones the pre-handle pass never reached after a rewrite.
    pub async fn post_handle(&self, request: &Request, response: Response) -> Response {
        let mut response = response;

        for interceptor in &self.interceptors {
            if !interceptor.handles_response() || !interceptor.checker(request) {
                continue;
            }
            match interceptor.post_handle(request, response.clone()).await {
                Ok(next) => response = next,
                Err(e) => {
                    tracing::warn!(
                        interceptor = interceptor.name(),
                        url = %request.url,
                        error = %e,
                        "post-handle failed, keeping response"
                    );
                }
            }
        }

        response
    }
}
