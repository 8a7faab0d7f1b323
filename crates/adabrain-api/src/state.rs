//! Application state wiring the relay together.
//!
//! AppState pins the relay's ports to the concrete infra implementations:
//! the SQLite memory store and the OpenAI-compatible agent backend. Both
//! are constructed lazily on first use, so the server starts even when
//! neither is reachable.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use adabrain_core::agent::box_backend::BoxAgentBackend;
use adabrain_core::agent::gateway::AgentGateway;
use adabrain_core::lazy::LazyShared;
use adabrain_core::memory::box_store::BoxMemoryStore;
use adabrain_core::memory::gateway::MemoryGateway;
use adabrain_core::relay::{Relay, RelayOptions};
use adabrain_infra::character::load_character;
use adabrain_infra::config::{character_path, memory_db_path};
use adabrain_infra::sqlite::memory::SqliteMemoryStore;
use adabrain_infra::upstream::OpenAiAgentBackend;
use adabrain_types::config::RelayConfig;

/// Shared state handed to every HTTP and WebSocket handler.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub config: Arc<RelayConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the persona and wire the lazily constructed shared clients.
    pub async fn init(config: RelayConfig, data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let character = load_character(&character_path(&config, &data_dir)).await;
        let memory = memory_gateway(&config, &data_dir);
        let agent = agent_gateway(&config);

        let relay = Relay::new(agent, memory, character, RelayOptions::from(&config));

        Ok(Self {
            relay: Arc::new(relay),
            config: Arc::new(config),
            data_dir,
        })
    }

    pub fn memory_db(&self) -> PathBuf {
        memory_db_path(&self.config, &self.data_dir)
    }
}

fn memory_gateway(config: &RelayConfig, data_dir: &Path) -> MemoryGateway {
    let path = memory_db_path(config, data_dir);
    let store = LazyShared::new("memory store", move || {
        let path = path.clone();
        async move {
            SqliteMemoryStore::open(&path)
                .await
                .map(BoxMemoryStore::new)
        }
    });
    MemoryGateway::new(store, Duration::from_millis(config.memory_timeout_ms))
}

fn agent_gateway(config: &RelayConfig) -> AgentGateway {
    let upstream = config.upstream.clone();
    let backend = LazyShared::new("upstream agent", move || {
        let upstream = upstream.clone();
        async move { OpenAiAgentBackend::from_config(&upstream).map(BoxAgentBackend::new) }
    });
    AgentGateway::new(backend, config.model.clone())
}
