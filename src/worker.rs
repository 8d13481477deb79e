// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Fetch orchestrator
//!
//! Entry point for intercepted fetches. Per event:
//!
//! 1. ignore filters may hand the event back to the platform
//! 2. the interceptor chain may rewrite, answer or block the request
//! 3. the request goes out, bound to the page's abort signal
//! 4. the response is threaded through the post-handlers and returned

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use reqwest::StatusCode;
use tokio::sync::oneshot;

use crate::bridge::{ClientRegistry, GlobalMessage, MessageBridge, MessageQueueMsg};
use crate::cache::{CacheStorage, CacheStore};
use crate::config::WorkerConfig;
use crate::error::{Error, Result};
use crate::filter::{self, IgnoreFilter, PageFilter, StaticAssetFilter};
use crate::http::{Fetcher, HttpClient, Request, Response};
use crate::interceptor::{AuthorizationInterceptor, ChainOutcome, Interceptor, InterceptorChain};
use crate::session::SessionStore;

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, install hook not yet run
    Parsed,
    /// Installed and waiting to activate
    Installed,
    /// Controlling pages
    Activated,
}

/// What the orchestrator did with a fetch event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// An ignore filter matched; default network handling applies
    Ignored { filter: String },
    /// No interceptor applied; default network handling applies
    Unhandled,
    /// Fulfilled with an interceptor's canned response
    ShortCircuited,
    /// Fulfilled with a synthesized block response
    Blocked { interceptor: String },
    /// Fulfilled with the network result after post-handling
    Fetched,
}

impl Dispatch {
    /// Whether the platform should fetch on its own
    pub fn is_unhandled(&self) -> bool {
        matches!(self, Dispatch::Ignored { .. } | Dispatch::Unhandled)
    }
}

/// An intercepted fetch awaiting a response
pub struct FetchEvent {
    request: Request,
    responder: Mutex<Option<oneshot::Sender<Result<Response>>>>,
}

/// Page side of a fetch event
pub struct PendingResponse {
    rx: oneshot::Receiver<Result<Response>>,
}

impl PendingResponse {
    /// Wait for the worker's answer; `None` means the event was left unhandled
    pub async fn wait(self) -> Option<Result<Response>> {
        self.rx.await.ok()
    }
}

impl FetchEvent {
    /// Create an event for a page request
    pub fn new(request: Request) -> (Self, PendingResponse) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                request,
                responder: Mutex::new(Some(tx)),
            },
            PendingResponse { rx },
        )
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Fulfill the event; fails if already fulfilled or the page went away
    pub fn respond_with(&self, result: Result<Response>) -> Result<()> {
        let tx = self
            .responder
            .lock()
            .take()
            .ok_or_else(|| Error::already_responded(self.request.url_str()))?;
        tx.send(result).map_err(|_| Error::ClientGone)
    }

    /// Whether the event has been fulfilled
    pub fn is_responded(&self) -> bool {
        self.responder.lock().is_none()
    }
}

/// Service worker wiring filters, interceptors, session and clients
pub struct ServiceWorker {
    config: Arc<WorkerConfig>,
    filters: Vec<Box<dyn IgnoreFilter>>,
    chain: InterceptorChain,
    fetcher: Arc<dyn Fetcher>,
    session: Arc<SessionStore>,
    bridge: Arc<MessageBridge>,
    caches: CacheStorage,
    cache: Arc<CacheStore>,
    state: RwLock<WorkerState>,
}

impl ServiceWorker {
    /// Create a worker fetching over HTTP
    pub fn new(config: WorkerConfig) -> Result<Self> {
        Self::with_fetcher(config, Arc::new(HttpClient::new()?))
    }

    /// Create a worker with the default filters and the authorization interceptor
    pub fn with_fetcher(config: WorkerConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let session = Arc::new(SessionStore::new());
        let clients = Arc::new(ClientRegistry::new());
        let bridge = Arc::new(MessageBridge::new(clients, session.clone()));

        let authorization =
            AuthorizationInterceptor::new(config.clone(), session.clone(), bridge.clone())?;
        let chain = InterceptorChain::new().with(Arc::new(authorization));

        let filters: Vec<Box<dyn IgnoreFilter>> = vec![
            Box::new(StaticAssetFilter),
            Box::new(PageFilter::new(config.api_prefix.clone())),
        ];

        let caches = CacheStorage::new();
        let cache = caches.open(&config.cache_name);

        Ok(Self {
            config,
            filters,
            chain,
            fetcher,
            session,
            bridge,
            caches,
            cache,
            state: RwLock::new(WorkerState::Parsed),
        })
    }

    /// Append an interceptor after the built-in ones
    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.chain.add(interceptor);
    }

    /// Append an ignore filter
    pub fn add_filter(&mut self, filter: Box<dyn IgnoreFilter>) {
        self.filters.push(filter);
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn bridge(&self) -> &Arc<MessageBridge> {
        &self.bridge
    }

    pub fn clients(&self) -> &Arc<ClientRegistry> {
        self.bridge.clients()
    }

    pub fn chain(&self) -> &InterceptorChain {
        &self.chain
    }

    pub fn filters(&self) -> &[Box<dyn IgnoreFilter>] {
        &self.filters
    }

    /// Cache store opened at startup
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn caches(&self) -> &CacheStorage {
        &self.caches
    }

    pub fn state(&self) -> WorkerState {
        *self.state.read()
    }

    /// Install hook: skip waiting for older workers
    pub fn install(&self) {
        *self.state.write() = WorkerState::Installed;
        tracing::info!("installed, skipping wait");
    }

    /// Activate hook: take control of every open page
    pub fn activate(&self) -> usize {
        *self.state.write() = WorkerState::Activated;
        let claimed = self.clients().claim();
        tracing::info!(claimed, "activated");
        claimed
    }

    /// Post a message to pages
    pub fn send_message_to_client(&self, envelope: &MessageQueueMsg) -> usize {
        self.bridge.send_message_to_client(envelope)
    }

    /// Control message from a page
    pub fn receive_message_from_client(&self, message: GlobalMessage) {
        self.bridge.receive_message_from_client(message)
    }

    /// Handle a fetch event
    ///
    /// Every path either leaves the event untouched or fulfills it; failures
    /// to fulfill are logged, never returned. A failed or aborted network call
    /// fulfills the event with that error, so the page sees a network error
    /// rather than a synthesized response.
    pub async fn handle_fetch(&self, event: &FetchEvent) -> Dispatch {
        let original = event.request();

        if let Some(name) = filter::first_match(&self.filters, original).await {
            tracing::trace!(url = %original.url, filter = name, "ignored");
            return Dispatch::Ignored {
                filter: name.to_string(),
            };
        }

        let request = match self.chain.pre_handle(original.clone()).await {
            ChainOutcome::Untouched => return Dispatch::Unhandled,
            ChainOutcome::Respond(response) => {
                Self::fulfill(event, Ok(response));
                return Dispatch::ShortCircuited;
            }
            ChainOutcome::Blocked { interceptor } => {
                tracing::info!(url = %original.url, interceptor = %interceptor, "intercepted by worker");
                let response =
                    Response::text_response(StatusCode::OK, format!("Intercepted by {}", interceptor));
                Self::fulfill(event, Ok(response));
                return Dispatch::Blocked { interceptor };
            }
            ChainOutcome::Forward(request) => request,
        };

        let snapshot = request.clone();
        let result = match self.dispatch(request).await {
            Ok(response) => Ok(self.chain.post_handle(&snapshot, response).await),
            Err(e) => {
                if e.is_aborted() {
                    tracing::info!(url = %original.url, "event stop by abort");
                } else {
                    tracing::warn!(url = %original.url, error = %e, "network fetch failed");
                }
                Err(e)
            }
        };

        Self::fulfill(event, result);
        Dispatch::Fetched
    }

    /// Handle a request end to end, fetching directly when the event is
    /// left unhandled
    pub async fn fetch(&self, request: Request) -> Result<Response> {
        let (event, pending) = FetchEvent::new(request);
        let dispatch = self.handle_fetch(&event).await;

        if dispatch.is_unhandled() {
            let FetchEvent { request, .. } = event;
            return self.dispatch(request).await;
        }

        drop(event);
        pending
            .wait()
            .await
            .unwrap_or_else(|| Err(Error::other("fetch event dropped without response")))
    }

    /// Network round trip raced against the request's abort signal
    async fn dispatch(&self, request: Request) -> Result<Response> {
        let signal = request.signal.clone();
        let url = request.url_str().to_string();
        if signal.is_aborted() {
            return Err(Error::aborted(url));
        }

        tokio::select! {
            result = self.fetcher.fetch(request) => result,
            _ = signal.aborted() => Err(Error::aborted(url)),
        }
    }

    fn fulfill(event: &FetchEvent, result: Result<Response>) {
        match event.respond_with(result) {
            Ok(()) => {}
            Err(Error::ClientGone) => {
                tracing::debug!(url = %event.request().url, "page went away before the response");
            }
            Err(e) => {
                tracing::error!(url = %event.request().url, error = %e, "event respond error");
            }
        }
    }
}
