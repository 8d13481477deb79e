// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Session token ownership
//!
//! One store per worker instance. Every interceptor and the message bridge
//! share it through an `Arc`, so there is exactly one live token.
//!
//! Reads and writes are not serialized across in-flight fetches: a logout
//! landing mid-flight may race with a request that already attached the old
//! token. Callers tolerate that.

use parking_lot::RwLock;

/// Holder of the current session token
#[derive(Debug, Default)]
pub struct SessionStore {
    token: RwLock<Option<String>>,
}

impl SessionStore {
    /// Create a store with no active session
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token; empty strings count as no session
    pub fn token(&self) -> Option<String> {
        self.token.read().clone().filter(|t| !t.is_empty())
    }

    /// Whether a session is active
    pub fn has_token(&self) -> bool {
        self.token.read().as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Replace the token
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        tracing::debug!(empty = token.is_empty(), "set user token");
        *self.token.write() = Some(token);
    }

    /// Drop the token, returning whether one was held
    pub fn clear(&self) -> bool {
        let previous = self.token.write().take();
        if previous.is_some() {
            tracing::debug!("cleared user token");
        }
        previous.is_some()
    }
}
