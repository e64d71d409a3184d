//! OpenAI chat completions wire types.
//!
//! Only the fields the relay reads are modelled; everything else in a chunk
//! is ignored.

use serde::{Deserialize, Serialize};

use crate::upstream::{ChatMessage, UpstreamError};

/// Terminal `data:` payload of an OpenAI event stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Streaming chat completion request body.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
}

/// One `data:` event of the stream.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// `{"error": {...}}` envelope returned on failed calls.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub message: String,
}

/// Decode one event payload into its text delta.
///
/// Returns `Ok(None)` for chunks that carry no text (role-only, finish or
/// usage chunks).
pub fn parse_chunk(data: &str) -> Result<Option<String>, UpstreamError> {
    let chunk: ChatCompletionChunk =
        serde_json::from_str(data).map_err(|e| UpstreamError::Payload(e.to_string()))?;

    if let Some(error) = chunk.error {
        return Err(UpstreamError::provider(error.message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

/// Human-readable message for a non-success response body.
pub fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => format!("HTTP {status}: {}", body.trim()),
    }
}
