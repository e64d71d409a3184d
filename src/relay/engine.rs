//! Relay orchestrator: one inbound chat request to one upstream stream.
//!
//! For each request the relay:
//! 1. Resolves the upstream credential
//! 2. Opens a streaming completion with a system and a user message
//! 3. Spawns a producer task that forwards non-empty deltas over a bounded channel
//! 4. Waits for the first event so pre-stream failures keep their status code

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::credential::CredentialSource;
use crate::metrics::RelayMetrics;
use crate::relay::error::RelayError;
use crate::relay::request::ChatRequest;
use crate::upstream::{CompletionProvider, DeltaStream, UpstreamError};

/// An event on the per-request forwarding channel.
#[derive(Debug)]
pub enum RelayEvent {
    /// A non-empty text delta, in upstream order.
    Delta(String),
    /// The upstream stream ended normally.
    Done { chunks: usize },
    /// The upstream stream failed.
    Error(UpstreamError),
}

/// A relayed stream whose status is already decided.
///
/// `first` is the event that was awaited before committing to a 200; the
/// rest arrive on `rx`.
#[derive(Debug)]
pub struct RelayStream {
    pub request_id: String,
    pub first: Option<RelayEvent>,
    pub rx: mpsc::Receiver<RelayEvent>,
}

/// The relay.
pub struct Relay {
    /// Upstream provider.
    provider: Arc<dyn CompletionProvider>,

    /// Credential strategy chosen at startup.
    credentials: CredentialSource,

    /// Model used when the request has none.
    default_model: String,

    /// Optional bound on total stream duration.
    stream_timeout: Option<Duration>,

    /// Forwarding channel capacity.
    channel_capacity: usize,

    metrics: Arc<RelayMetrics>,
}

impl Relay {
    /// Create a new relay.
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        config: &Config,
        metrics: Arc<RelayMetrics>,
    ) -> Self {
        Self {
            provider,
            credentials: config.credentials.source.clone(),
            default_model: config.upstream.default_model.clone(),
            stream_timeout: config.upstream.stream_timeout(),
            channel_capacity: config.upstream.channel_capacity.max(1),
            metrics,
        }
    }

    /// Relay one chat request.
    ///
    /// Returns `Err` only for failures that happen before the first delta is
    /// available; everything after that travels through the returned stream.
    pub async fn submit(&self, request: ChatRequest) -> Result<RelayStream, RelayError> {
        let result = self.open(request).await;
        match &result {
            Ok(_) => self.metrics.record_request("streamed"),
            Err(e) => {
                warn!(error = %e, "Chat request failed before streaming");
                self.metrics.record_request(e.outcome());
            }
        }
        result
    }

    async fn open(&self, request: ChatRequest) -> Result<RelayStream, RelayError> {
        let request_id = Uuid::new_v4().to_string();

        let api_key = self.credentials.resolve(request.api_key.as_ref())?;
        let model = request.resolved_model(&self.default_model);
        let messages = request.messages();

        info!(request_id = request_id, model, "Chat request");

        // The stream deadline also covers waiting for the upstream to answer.
        let deadline = self.stream_timeout.map(|t| Instant::now() + t);
        let opening = self.provider.open_stream(&api_key, model, &messages);
        let upstream = match (deadline, self.stream_timeout) {
            (Some(deadline), Some(timeout)) => tokio::time::timeout_at(deadline, opening)
                .await
                .map_err(|_| UpstreamError::Timeout(timeout))??,
            _ => opening.await?,
        };
        drop(api_key);

        let mut rx = self.spawn_forwarder(request_id.clone(), upstream, deadline);

        // Hold the response until the first event so an early failure can
        // still be reported with a status code.
        let first = match rx.recv().await {
            Some(RelayEvent::Error(e)) => return Err(e.into()),
            other => other,
        };

        Ok(RelayStream {
            request_id,
            first,
            rx,
        })
    }

    /// Drain `upstream` into a bounded channel on its own task.
    ///
    /// The task stops as soon as the receiver is dropped, releasing the
    /// upstream connection.
    fn spawn_forwarder(
        &self,
        request_id: String,
        mut upstream: DeltaStream,
        deadline: Option<Instant>,
    ) -> mpsc::Receiver<RelayEvent> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let metrics = self.metrics.clone();
        let timeout = self.stream_timeout;

        tokio::spawn(async move {
            let mut forwarded = 0;

            loop {
                let next = tokio::select! {
                    _ = tx.closed() => {
                        metrics.record_cancelled();
                        debug!(request_id, forwarded, "Caller went away, dropping upstream stream");
                        break;
                    }
                    next = next_delta(&mut upstream, deadline, timeout) => next,
                };

                match next {
                    Some(Ok(delta)) => {
                        if delta.is_empty() {
                            continue;
                        }

                        if tx.send(RelayEvent::Delta(delta)).await.is_err() {
                            metrics.record_cancelled();
                            debug!(request_id, forwarded, "Caller went away, dropping upstream stream");
                            break;
                        }
                        forwarded += 1;
                        metrics.record_chunk();

                        tokio::task::yield_now().await;
                    }
                    Some(Err(e)) => {
                        if forwarded > 0 {
                            metrics.record_truncated();
                        }
                        warn!(request_id, forwarded, error = %e, "Upstream stream failed");
                        if tx.send(RelayEvent::Error(e)).await.is_err() {
                            metrics.record_cancelled();
                        }
                        break;
                    }
                    None => {
                        if tx.send(RelayEvent::Done { chunks: forwarded }).await.is_err() {
                            metrics.record_cancelled();
                        }
                        info!(request_id, chunks = forwarded, "Stream complete");
                        break;
                    }
                }
            }
        });

        rx
    }
}

/// Next item from `upstream`, or a timeout error once `deadline` passes.
async fn next_delta(
    upstream: &mut DeltaStream,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
) -> Option<Result<String, UpstreamError>> {
    match (deadline, timeout) {
        (Some(deadline), Some(timeout)) => {
            match tokio::time::timeout_at(deadline, upstream.next()).await {
                Ok(next) => next,
                Err(_) => Some(Err(UpstreamError::Timeout(timeout))),
            }
        }
        _ => upstream.next().await,
    }
}
