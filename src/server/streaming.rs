//! Plain-text chunked streaming for relayed responses.
//!
//! Converts a [`RelayStream`] into the body of a `text/plain` response: one
//! body frame per delta, no framing and no trailing marker. A failure after
//! the first frame surfaces as a body error, which makes the server abort the
//! chunked response so the caller sees a truncated body.

use axum::body::Body;
use bytes::Bytes;
use futures::stream::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::relay::{RelayError, RelayEvent, RelayStream};

/// Content type of a relayed body.
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Convert a relayed stream into a stream of body frames.
pub fn relay_to_byte_stream(
    stream: RelayStream,
) -> impl Stream<Item = Result<Bytes, RelayError>> + Send + 'static {
    tokio_stream::iter(stream.first)
        .chain(ReceiverStream::new(stream.rx))
        .map_while(|event| match event {
            RelayEvent::Delta(text) => Some(Ok(Bytes::from(text))),
            RelayEvent::Error(e) => Some(Err(RelayError::from(e))),
            RelayEvent::Done { .. } => None,
        })
}

/// Response body for a relayed stream.
pub fn relay_body(stream: RelayStream) -> Body {
    Body::from_stream(relay_to_byte_stream(stream))
}
