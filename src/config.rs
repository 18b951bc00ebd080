//! Runtime configuration for chat-relay.
//!
//! Server settings come from a JSON file; the upstream endpoint and
//! credential are resolved once at startup from the file and environment.
//! The API key is accepted from the environment only and startup fails if
//! it is absent, so no credential ever lives in a checked-in file or a
//! hardcoded fallback.

use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use serde::{Deserialize, Serialize};

/// Environment variable naming the upstream chat completions URL.
pub const BASE_URL_ENV: &str = "AI_BASE_URL";

/// Environment variable holding the upstream bearer token.
pub const API_KEY_ENV: &str = "AI_API_KEY";

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-relay", about = "Streaming chat-completion relay server")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address.
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream endpoint and credential.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Upstream TCP connect timeout in seconds.
    ///
    /// No overall request deadline is applied: relayed responses are
    /// long-lived streams and must not be cut off by a wall-clock timeout.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Upstream chat API settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Full chat completions URL, e.g.
    /// "https://api.example.com/v1/chat/completions".
    #[serde(default)]
    pub base_url: String,

    /// Bearer token for the upstream. Resolved from the environment only;
    /// never read from or written to the config file.
    #[serde(skip)]
    pub api_key: String,
}

impl Config {
    /// Load configuration from a JSON file, then overlay the environment.
    ///
    /// A missing file is not an error (defaults apply), but missing upstream
    /// settings after the overlay are: the process must not start without a
    /// base URL and an API key.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str(&data)?
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Config::default()
        };
        config.resolve_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Overlay environment variables onto the file-sourced settings and
    /// enforce that both upstream values are present.
    pub fn resolve_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(url) = lookup(BASE_URL_ENV) {
            self.upstream.base_url = url;
        }
        if let Some(key) = lookup(API_KEY_ENV) {
            self.upstream.api_key = key;
        }

        if self.upstream.base_url.is_empty() {
            bail!("upstream base URL not set: provide upstream.base_url in the config file or {BASE_URL_ENV}");
        }
        if self.upstream.api_key.is_empty() {
            bail!("upstream API key not set: export {API_KEY_ENV}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.server.connect_timeout_secs, 10);
        assert!(cfg.upstream.base_url.is_empty());
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let mut cfg = Config::default();
        cfg.upstream.base_url = "https://api.example.com/v1/chat/completions".to_string();
        let err = cfg.resolve_env(|_| None).unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn test_missing_base_url_is_fatal() {
        let mut cfg = Config::default();
        let err = cfg
            .resolve_env(|name| (name == API_KEY_ENV).then(|| "sk-test".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(BASE_URL_ENV));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut cfg = Config::default();
        cfg.upstream.base_url = "https://from-file.example.com".to_string();
        cfg.resolve_env(|name| match name {
            BASE_URL_ENV => Some("https://from-env.example.com".to_string()),
            API_KEY_ENV => Some("sk-test".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.upstream.base_url, "https://from-env.example.com");
        assert_eq!(cfg.upstream.api_key, "sk-test");
    }

    #[test]
    fn test_file_base_url_with_env_key() {
        let mut cfg = Config::default();
        cfg.upstream.base_url = "https://from-file.example.com".to_string();
        cfg.resolve_env(|name| (name == API_KEY_ENV).then(|| "sk-test".to_string()))
            .unwrap();
        assert_eq!(cfg.upstream.base_url, "https://from-file.example.com");
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut cfg = Config::default();
        cfg.upstream.api_key = "sk-secret".to_string();
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn test_partial_file_parses() {
        let cfg: Config =
            serde_json::from_str(r#"{"upstream":{"base_url":"https://u.example.com"}}"#).unwrap();
        assert_eq!(cfg.upstream.base_url, "https://u.example.com");
        assert_eq!(cfg.server.connect_timeout_secs, 10);
    }
}
