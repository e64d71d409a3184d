//! Prometheus counters for relayed requests.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Relay counters, registered on a private registry.
pub struct RelayMetrics {
    registry: Registry,
    requests: IntCounterVec,
    chunks_forwarded: IntCounter,
    streams_truncated: IntCounter,
    streams_cancelled: IntCounter,
}

impl RelayMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("relay_requests_total", "Chat requests by outcome"),
            &["outcome"],
        )?;
        let chunks_forwarded = IntCounter::new(
            "relay_chunks_forwarded_total",
            "Text deltas forwarded to callers",
        )?;
        let streams_truncated = IntCounter::new(
            "relay_streams_truncated_total",
            "Streams cut short by an upstream failure after the first chunk",
        )?;
        let streams_cancelled = IntCounter::new(
            "relay_streams_cancelled_total",
            "Streams abandoned because the caller disconnected",
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(chunks_forwarded.clone()))?;
        registry.register(Box::new(streams_truncated.clone()))?;
        registry.register(Box::new(streams_cancelled.clone()))?;

        Ok(Self {
            registry,
            requests,
            chunks_forwarded,
            streams_truncated,
            streams_cancelled,
        })
    }

    pub fn record_request(&self, outcome: &str) {
        self.requests.with_label_values(&[outcome]).inc();
    }

    pub fn record_chunk(&self) {
        self.chunks_forwarded.inc();
    }

    pub fn record_truncated(&self) {
        self.streams_truncated.inc();
    }

    pub fn record_cancelled(&self) {
        self.streams_cancelled.inc();
    }

    pub fn requests(&self, outcome: &str) -> u64 {
        self.requests.with_label_values(&[outcome]).get()
    }

    pub fn chunks_forwarded(&self) -> u64 {
        self.chunks_forwarded.get()
    }

    pub fn streams_cancelled(&self) -> u64 {
        self.streams_cancelled.get()
    }

    /// Render all counters in the Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
