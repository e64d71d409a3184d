//! Upstream credential sourcing.
//!
//! A deployment picks one source at startup: either every request carries its
//! own API key, or the key is read from an environment variable. The two are
//! never mixed within one process.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::relay::error::RelayError;

/// Upstream API key. Redacted in `Debug` output.
pub type ApiKey = SecretString;

/// Where the upstream API key is taken from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// The `api_key` field of each chat request.
    #[default]
    RequestField,
    /// The named environment variable, re-read on every request.
    Environment(String),
}

impl CredentialSource {
    /// Resolve the API key for one request.
    ///
    /// `supplied` is the request's `api_key` field; it is ignored by the
    /// environment source.
    pub fn resolve(&self, supplied: Option<&ApiKey>) -> Result<ApiKey, RelayError> {
        match self {
            CredentialSource::RequestField => match supplied.map(|key| key.expose_secret().trim())
            {
                Some(key) if !key.is_empty() => Ok(SecretString::from(key.to_string())),
                _ => Err(RelayError::Config(
                    "request did not include an api_key".to_string(),
                )),
            },
            CredentialSource::Environment(var) => match std::env::var(var) {
                Ok(key) if !key.trim().is_empty() => Ok(SecretString::from(key.trim().to_string())),
                _ => Err(RelayError::Config(format!(
                    "environment variable {var} is not set"
                ))),
            },
        }
    }

    /// Short label for logs.
    pub fn describe(&self) -> String {
        match self {
            CredentialSource::RequestField => "request field".to_string(),
            CredentialSource::Environment(var) => format!("environment ({var})"),
        }
    }
}
