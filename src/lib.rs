//! chat-relay: streaming chat-completion relay.
//!
//! Accepts a chat request over HTTP, opens a streaming completion against an
//! OpenAI-compatible provider and forwards each text delta to the caller as
//! soon as it arrives, as a plain-text chunked body.

pub mod config;
pub mod credential;
pub mod metrics;
pub mod relay;
pub mod server;
pub mod upstream;
