// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # swgate - Service Worker Request Interception
//!
//! Background-worker layer that sits between a web app's pages and its API.
//! Outgoing requests pass through ignore filters and an interceptor chain
//! that can rewrite them, answer them directly, or attach the session token.
//!
//! ## Features
//!
//! - Ignore filters: static assets and page navigations bypass interception
//! - Interceptor chain: rewrite, short-circuit or block, then post-process
//! - Session token lifecycle: injected on protected calls, harvested from
//!   login responses, dropped on logout or server-side rejection
//! - Client messaging: broadcast or single-client delivery to open pages
//! - Abort propagation: cancelling the page request cancels the network call
//!
//! ## Example
//!
//! ```rust,no_run
//! use swgate::{FetchEvent, Request, ServiceWorker, WorkerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let worker = ServiceWorker::new(WorkerConfig::default())?;
//!     worker.install();
//!     worker.activate();
//!
//!     let request = Request::post("https://app.example/pump/api/login")?;
//!     let (event, pending) = FetchEvent::new(request);
//!     let dispatch = worker.handle_fetch(&event).await;
//!     println!("{:?}", dispatch);
//!     drop(event);
//!
//!     if let Some(result) = pending.wait().await {
//!         println!("status: {}", result?.status);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod interceptor;
pub mod session;
pub mod worker;

// Re-exports for convenience

// Worker
pub use worker::{Dispatch, FetchEvent, PendingResponse, ServiceWorker, WorkerState};

// Config
pub use config::{HttpClientConfig, RouteRule, WorkerConfig};

// Errors
pub use error::{Error, Result};

// HTTP
pub use http::{AbortSignal, Fetcher, HttpClient, Request, Response};

// Filters
pub use filter::{IgnoreFilter, PageFilter, StaticAssetFilter};

// Interceptors
pub use interceptor::{
    ApiResult, AuthorizationInterceptor, ChainOutcome, Interceptor, InterceptorChain, LoginData,
    PreHandle,
};

// Session and messaging
pub use bridge::{
    ChannelClient, Client, ClientRegistry, ConsumeType, GlobalMessage, LoginStatus,
    MessageBridge, MessageQueueMsg,
};
pub use session::SessionStore;

// Cache
pub use cache::{CacheStorage, CacheStore, CachedResponse};

/// swgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
