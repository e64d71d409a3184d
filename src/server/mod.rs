//! HTTP server exposing the relay.
//!
//! - [`routes`]: Router, shared state and route handlers
//! - [`streaming`]: Plain-text chunked body for relayed streams

pub mod routes;
pub mod streaming;
