// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP layer
//!
//! Request/response values that flow through the pipeline, plus the network
//! transport the orchestrator fetches with.

mod client;
mod request;
mod response;

pub use client::{Fetcher, HttpClient};
pub use request::{AbortSignal, Request};
pub use response::Response;

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("swgate/", env!("CARGO_PKG_VERSION"));
