//! Upstream language-model provider.
//!
//! - [`openai`]: HTTP client for the OpenAI streaming chat completions API
//! - [`wire`]: Request/chunk/error payloads on the provider's wire
//!
//! The relay only needs one capability from a provider: open a streaming
//! completion and hand back the text deltas in order.

pub mod openai;
pub mod wire;

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credential::ApiKey;

#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The provider rejected the call or reported a fault.
    #[error("{message}")]
    Provider {
        status: Option<u16>,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("event stream error: {0}")]
    Stream(String),

    #[error("unexpected payload: {0}")]
    Payload(String),

    #[error("stream exceeded {0:?}")]
    Timeout(Duration),
}

impl UpstreamError {
    pub fn provider(message: impl Into<String>) -> Self {
        UpstreamError::Provider {
            status: None,
            message: message.into(),
        }
    }

    /// True when the provider itself reported the failure.
    pub fn is_provider(&self) -> bool {
        matches!(self, UpstreamError::Provider { .. })
    }
}

/// Message role on the upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Ordered, finite, non-restartable sequence of text deltas.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, UpstreamError>> + Send>>;

/// A provider that can stream a chat completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Open a streaming completion for `messages` on `model`.
    ///
    /// Errors returned here happen before any delta exists; errors yielded by
    /// the stream may arrive at any point.
    async fn open_stream(
        &self,
        api_key: &ApiKey,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<DeltaStream, UpstreamError>;
}
