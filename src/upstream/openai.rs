//! OpenAI-compatible streaming chat completions client.
//!
//! Sends `POST {base_url}/chat/completions` with `stream: true` and turns the
//! Server-Sent Events response into a [`DeltaStream`].

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{future, StreamExt};
use reqwest::header;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::credential::ApiKey;
use crate::upstream::wire::{self, ChatCompletionRequest, DONE_SENTINEL};
use crate::upstream::{ChatMessage, CompletionProvider, DeltaStream, UpstreamError};

/// Provider backed by an OpenAI-compatible HTTP API.
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl OpenAiProvider {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn open_stream(
        &self,
        api_key: &ApiKey,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<DeltaStream, UpstreamError> {
        let body = ChatCompletionRequest {
            model,
            messages,
            stream: true,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key.expose_secret())
            .header(header::ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|e| {
                debug!(status = status.as_u16(), error = %e, "Failed to read upstream error body");
                String::new()
            });
            return Err(UpstreamError::Provider {
                status: Some(status.as_u16()),
                message: wire::error_message(status.as_u16(), &text),
            });
        }

        debug!(model, status = status.as_u16(), "Upstream stream opened");

        let stream = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                future::ready(!matches!(event, Ok(event) if event.data.trim() == DONE_SENTINEL))
            })
            .filter_map(|event| {
                future::ready(match event {
                    Ok(event) if event.data.trim().is_empty() => None,
                    Ok(event) => wire::parse_chunk(&event.data).transpose(),
                    Err(e) => Some(Err(UpstreamError::Stream(e.to_string()))),
                })
            });

        Ok(Box::pin(stream))
    }
}
