//! Runtime configuration for chat-relay.
//!
//! Configuration is loaded from a JSON file (missing file or missing fields
//! fall back to defaults) and then overridden by command-line flags.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::credential::CredentialSource;

/// Environment variable read by the environment credential source unless
/// configured otherwise.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-relay", about = "Streaming chat-completion relay")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides the config file).
    #[arg(long)]
    pub listen: Option<String>,

    /// Where the upstream API key comes from.
    #[arg(long, value_enum)]
    pub credential_source: Option<CredentialMode>,

    /// Environment variable holding the API key (implies `--credential-source env`).
    #[arg(long)]
    pub api_key_env: Option<String>,

    /// Model used when a request does not name one.
    #[arg(long)]
    pub default_model: Option<String>,

    /// Base URL of the OpenAI-compatible upstream API.
    #[arg(long)]
    pub upstream_url: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,
}

/// Credential sourcing as selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CredentialMode {
    /// Take the key from the `api_key` field of each request.
    Request,
    /// Read the key from an environment variable on every request.
    Env,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Upstream provider configuration.
    pub upstream: UpstreamConfig,

    /// Credential sourcing.
    pub credentials: CredentialConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8000").
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Upstream provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the chat completions API, without the `/chat/completions` suffix.
    pub base_url: String,

    /// Model used when the request omits one.
    pub default_model: String,

    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Upper bound on a whole relayed stream in seconds (None = unbounded).
    pub stream_timeout_secs: Option<u64>,

    /// Capacity of the per-request chunk channel.
    pub channel_capacity: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            default_model: "gpt-4.1-mini".to_string(),
            connect_timeout_secs: 10,
            stream_timeout_secs: None,
            channel_capacity: 16,
        }
    }
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn stream_timeout(&self) -> Option<Duration> {
        self.stream_timeout_secs.map(Duration::from_secs)
    }
}

/// Credential settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    pub source: CredentialSource,
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Apply command-line overrides on top of the file configuration.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(listen) = &cli.listen {
            self.server.listen = listen.clone();
        }
        if let Some(model) = &cli.default_model {
            self.upstream.default_model = model.clone();
        }
        if let Some(url) = &cli.upstream_url {
            self.upstream.base_url = url.clone();
        }

        match (cli.credential_source, &cli.api_key_env) {
            (Some(CredentialMode::Request), _) => {
                self.credentials.source = CredentialSource::RequestField;
            }
            (Some(CredentialMode::Env), Some(var)) | (None, Some(var)) => {
                self.credentials.source = CredentialSource::Environment(var.clone());
            }
            (Some(CredentialMode::Env), None) => {
                if self.credentials.source == CredentialSource::RequestField {
                    self.credentials.source =
                        CredentialSource::Environment(DEFAULT_API_KEY_ENV.to_string());
                }
            }
            (None, None) => {}
        }
    }
}
