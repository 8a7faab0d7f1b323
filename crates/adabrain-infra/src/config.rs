//! Relay configuration loader and data-directory layout.
//!
//! Reads `config.toml` from the data directory (`~/.ada-marie/` in
//! production) and deserializes it into [`RelayConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use adabrain_types::config::RelayConfig;

/// Default character card file name inside the data directory.
const CHARACTER_FILE: &str = "ada_marie_character.json";

/// Default memory database file name inside the data directory.
const MEMORY_DB_FILE: &str = "memories.db";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `ADA_DATA_DIR` environment variable
/// 2. `~/.ada-marie`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ADA_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".ada-marie");
    }

    PathBuf::from(".ada-marie")
}

/// Load relay configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`RelayConfig::default()`].
/// - Unreadable or unparsable file: a warning, then the default.
pub async fn load_relay_config(data_dir: &Path) -> RelayConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return RelayConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return RelayConfig::default();
        }
    };

    match toml::from_str::<RelayConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            RelayConfig::default()
        }
    }
}

/// Character card location: the configured path, else the data directory default.
pub fn character_path(config: &RelayConfig, data_dir: &Path) -> PathBuf {
    config
        .character_path
        .clone()
        .unwrap_or_else(|| data_dir.join(CHARACTER_FILE))
}

/// Memory database location: the configured path, else the data directory default.
pub fn memory_db_path(config: &RelayConfig, data_dir: &Path) -> PathBuf {
    config
        .memory_db
        .clone()
        .unwrap_or_else(|| data_dir.join(MEMORY_DB_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_relay_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_relay_config(tmp.path()).await;
        assert_eq!(config.port, 8765);
        assert_eq!(config.turn_timeout_secs, 120);
        assert_eq!(config.recall_limit, 3);
    }

    #[tokio::test]
    async fn load_relay_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
port = 9000
model = "gpt-4o"

[upstream]
base_url = "http://localhost:11434/v1"
"#,
        )
        .await
        .unwrap();

        let config = load_relay_config(tmp.path()).await;
        assert_eq!(config.port, 9000);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(
            config.upstream.base_url.as_deref(),
            Some("http://localhost:11434/v1")
        );
        // Untouched fields keep their defaults
        assert_eq!(config.host, "127.0.0.1");
    }

    #[tokio::test]
    async fn load_relay_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "port = [not a port")
            .await
            .unwrap();

        let config = load_relay_config(tmp.path()).await;
        assert_eq!(config.port, 8765);
    }

    #[test]
    fn default_paths_live_in_data_dir() {
        let data_dir = PathBuf::from("/home/user/.ada-marie");
        let config = RelayConfig::default();
        assert_eq!(
            character_path(&config, &data_dir),
            PathBuf::from("/home/user/.ada-marie/ada_marie_character.json")
        );
        assert_eq!(
            memory_db_path(&config, &data_dir),
            PathBuf::from("/home/user/.ada-marie/memories.db")
        );
    }

    #[test]
    fn configured_paths_win() {
        let config = RelayConfig {
            character_path: Some(PathBuf::from("/etc/ada/card.json")),
            memory_db: Some(PathBuf::from("/var/lib/ada/mem.db")),
            ..RelayConfig::default()
        };
        let data_dir = PathBuf::from("/unused");
        assert_eq!(character_path(&config, &data_dir), PathBuf::from("/etc/ada/card.json"));
        assert_eq!(memory_db_path(&config, &data_dir), PathBuf::from("/var/lib/ada/mem.db"));
    }

    #[test]
    fn resolve_data_dir_from_env() {
        // SAFETY: This test is single-threaded and restores the env var immediately.
        unsafe {
            std::env::set_var("ADA_DATA_DIR", "/tmp/test-ada-marie");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-ada-marie"));
        unsafe {
            std::env::remove_var("ADA_DATA_DIR");
        }
    }
}
