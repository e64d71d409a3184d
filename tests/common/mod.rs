//! Shared fixtures: a scripted provider and a router built around it.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use futures::stream::{self, StreamExt};

use chat_relay::config::Config;
use chat_relay::credential::ApiKey;
use chat_relay::metrics::RelayMetrics;
use chat_relay::relay::Relay;
use chat_relay::server::routes::{build_router, AppState};
use chat_relay::upstream::{ChatMessage, CompletionProvider, DeltaStream, UpstreamError};

/// One scripted stream item.
#[derive(Debug, Clone)]
pub enum Step {
    Delta(&'static str),
    ProviderError(&'static str),
    TransportError(&'static str),
    /// Never yields again.
    Hang,
}

/// Provider that replays a fixed script and records what it was asked.
pub struct ScriptedProvider {
    open_error: Option<&'static str>,
    hang_on_open: bool,
    steps: Vec<Step>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, Vec<ChatMessage>)>>,
    dropped: Arc<AtomicBool>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            open_error: None,
            hang_on_open: false,
            steps,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            dropped: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Provider whose `open_stream` fails with a provider error.
    pub fn rejecting(message: &'static str) -> Arc<Self> {
        Arc::new(Self {
            open_error: Some(message),
            hang_on_open: false,
            steps: Vec::new(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            dropped: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Provider that accepts the call but never answers it.
    pub fn unresponsive() -> Arc<Self> {
        Arc::new(Self {
            open_error: None,
            hang_on_open: true,
            steps: Vec::new(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            dropped: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.seen.lock().unwrap().clone()
    }

    /// True once the last stream handed out has been dropped.
    pub fn stream_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn open_stream(
        &self,
        _api_key: &ApiKey,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<DeltaStream, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((model.to_string(), messages.to_vec()));

        if self.hang_on_open {
            return std::future::pending().await;
        }

        if let Some(message) = self.open_error {
            return Err(UpstreamError::Provider {
                status: Some(401),
                message: message.to_string(),
            });
        }

        self.dropped.store(false, Ordering::SeqCst);
        let guard = DropFlag(self.dropped.clone());

        let steps = self.steps.clone();
        let stream = stream::iter(steps).then(|step| async move {
            match step {
                Step::Delta(text) => Some(Ok(text.to_string())),
                Step::ProviderError(message) => Some(Err(UpstreamError::provider(message))),
                Step::TransportError(message) => {
                    Some(Err(UpstreamError::Stream(message.to_string())))
                }
                Step::Hang => std::future::pending().await,
            }
        });
        let stream = stream.filter_map(move |item| {
            let _ = &guard;
            futures::future::ready(item)
        });

        Ok(Box::pin(stream))
    }
}

/// Router around `provider` with the given configuration.
pub fn router_with(provider: Arc<ScriptedProvider>, config: &Config) -> (Router, Arc<RelayMetrics>) {
    let metrics = Arc::new(RelayMetrics::new().unwrap());
    let relay = Relay::new(provider, config, metrics.clone());
    let state = Arc::new(AppState {
        relay,
        metrics: metrics.clone(),
    });
    (build_router(state), metrics)
}

/// Router around `provider` with default configuration (credential per request).
pub fn router(provider: Arc<ScriptedProvider>) -> Router {
    router_with(provider, &Config::default()).0
}
