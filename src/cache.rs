// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Named response caches
//!
//! The worker opens its cache once at startup. Nothing in the fetch path
//! reads or writes it yet.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::http::{Request, Response};

/// Cached response with its insertion time
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub response: Response,
    pub stored_at: DateTime<Utc>,
}

/// A single named cache, keyed by method and URL
#[derive(Debug)]
pub struct CacheStore {
    name: String,
    entries: DashMap<String, CachedResponse>,
}

impl CacheStore {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
        }
    }

    fn key(request: &Request) -> String {
        format!("{} {}", request.method, request.url)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a response for a request, replacing any previous entry
    pub fn put(&self, request: &Request, response: Response) {
        self.entries.insert(
            Self::key(request),
            CachedResponse {
                response,
                stored_at: Utc::now(),
            },
        );
    }

    /// Look up the response stored for a request
    pub fn match_request(&self, request: &Request) -> Option<CachedResponse> {
        self.entries.get(&Self::key(request)).map(|e| e.value().clone())
    }

    /// Remove the entry for a request
    pub fn delete(&self, request: &Request) -> bool {
        self.entries.remove(&Self::key(request)).is_some()
    }

    /// Cached keys
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registry of named caches
#[derive(Debug, Default)]
pub struct CacheStorage {
    stores: DashMap<String, Arc<CacheStore>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a cache, creating it on first use
    pub fn open(&self, name: &str) -> Arc<CacheStore> {
        self.stores
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(cache = name, "opened cache store");
                Arc::new(CacheStore::new(name))
            })
            .clone()
    }

    pub fn has(&self, name: &str) -> bool {
        self.stores.contains_key(name)
    }

    /// Drop a cache and everything in it
    pub fn delete(&self, name: &str) -> bool {
        self.stores.remove(name).is_some()
    }
}
