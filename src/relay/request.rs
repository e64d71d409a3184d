//! Inbound chat request.

use secrecy::SecretString;
use serde::Deserialize;

use crate::upstream::ChatMessage;

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Instruction text, sent with the system role.
    pub developer_message: String,

    /// User text, sent with the user role.
    pub user_message: String,

    #[serde(default)]
    pub model: Option<String>,

    /// Only read when credentials come from the request.
    #[serde(default)]
    pub api_key: Option<SecretString>,
}

impl ChatRequest {
    /// The requested model, or `default` when absent or blank.
    pub fn resolved_model<'a>(&'a self, default: &'a str) -> &'a str {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(default)
    }

    /// The two upstream messages, system first.
    pub fn messages(&self) -> [ChatMessage; 2] {
        [
            ChatMessage::system(self.developer_message.clone()),
            ChatMessage::user(self.user_message.clone()),
        ]
    }
}
