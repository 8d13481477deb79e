// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for swgate
//!
//! Each variant carries enough context (URL, client id) to make a log line
//! useful on its own, since most of these errors end up logged rather than
//! returned to the page.

use thiserror::Error;

/// Result type alias for swgate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the interception layer
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The triggering request was aborted while the network call was in flight
    #[error("Request aborted: {url}")]
    Aborted { url: String },

    /// A fetch event was fulfilled twice
    #[error("Fetch event for {url} has already been responded to")]
    AlreadyResponded { url: String },

    /// The page side of a fetch event went away before it was fulfilled
    #[error("Client dropped the pending response")]
    ClientGone,

    /// Posting a message to a page client failed
    #[error("Failed to deliver message to client {client_id}: {reason}")]
    Delivery { client_id: String, reason: String },

    /// Response body was already read
    #[error("Response body already consumed: {url}")]
    BodyUsed { url: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an abort error for a request URL
    pub fn aborted(url: impl Into<String>) -> Self {
        Error::Aborted { url: url.into() }
    }

    /// Create a double-fulfillment error
    pub fn already_responded(url: impl Into<String>) -> Self {
        Error::AlreadyResponded { url: url.into() }
    }

    /// Create a delivery error
    pub fn delivery(client_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Delivery {
            client_id: client_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is an abort
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted { .. })
    }
}
