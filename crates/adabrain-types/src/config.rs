//! Relay configuration types.
//!
//! `RelayConfig` represents the `config.toml` in the data directory. Every
//! field has a default so an empty or missing file yields a working relay
//! (in echo mode when no upstream is configured).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Model identifier requested from the upstream agent.
    #[serde(default = "default_model")]
    pub model: String,

    /// Deadline for one streamed turn, in seconds.
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,

    /// Maximum number of memory snippets injected into a prompt.
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,

    /// Bound on any single memory store call, in milliseconds.
    #[serde(default = "default_memory_timeout_ms")]
    pub memory_timeout_ms: u64,

    /// Path to the persona character card (JSON).
    #[serde(default)]
    pub character_path: Option<PathBuf>,

    /// Path to the SQLite memory database. Defaults to `{data_dir}/memories.db`.
    #[serde(default)]
    pub memory_db: Option<PathBuf>,

    #[serde(default)]
    pub upstream: UpstreamConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8765
}

fn default_model() -> String {
    "claude-sonnet-4".to_string()
}

fn default_turn_timeout_secs() -> u64 {
    120
}

fn default_recall_limit() -> usize {
    3
}

fn default_memory_timeout_ms() -> u64 {
    2_000
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model: default_model(),
            turn_timeout_secs: default_turn_timeout_secs(),
            recall_limit: default_recall_limit(),
            memory_timeout_ms: default_memory_timeout_ms(),
            character_path: None,
            memory_db: None,
            upstream: UpstreamConfig::default(),
        }
    }
}

/// Connection settings for the upstream conversational agent.
///
/// When `base_url` is unset, or the API key variable is empty, the relay
/// runs in echo mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of an OpenAI-compatible API (e.g. `https://api.openai.com/v1`).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_api_key_env() -> String {
    "ADA_UPSTREAM_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    4_096
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_config_default_values() {
        let config = RelayConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8765);
        assert_eq!(config.model, "claude-sonnet-4");
        assert_eq!(config.turn_timeout_secs, 120);
        assert_eq!(config.recall_limit, 3);
        assert!(config.upstream.base_url.is_none());
    }

    #[test]
    fn test_relay_config_deserialize_empty_uses_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.port, 8765);
        assert_eq!(config.upstream.api_key_env, "ADA_UPSTREAM_API_KEY");
        assert_eq!(config.upstream.max_tokens, 4096);
    }

    #[test]
    fn test_relay_config_deserialize_with_values() {
        let toml_str = r#"
port = 9000
model = "gpt-4o-mini"
recall_limit = 5

[upstream]
base_url = "https://api.openai.com/v1"
"#;
        let config: RelayConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.recall_limit, 5);
        assert_eq!(
            config.upstream.base_url.as_deref(),
            Some("https://api.openai.com/v1")
        );
        // Untouched fields keep their defaults
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.turn_timeout_secs, 120);
    }
}
