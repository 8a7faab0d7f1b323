//! CLI definitions for the `ada-brain` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use adabrain_types::config::RelayConfig;

/// Ada Marie brain relay: WebSocket bridge between clients and the upstream agent.
#[derive(Parser)]
#[command(name = "ada-brain", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Only log warnings and errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed logging (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the WebSocket relay server.
    Serve(ServeArgs),

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Overrides for values in `config.toml`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Host to bind to.
    #[arg(long, env = "ADA_HOST")]
    pub host: Option<String>,

    /// Port to listen on.
    #[arg(short, long, env = "ADA_PORT")]
    pub port: Option<u16>,

    /// Model requested from the upstream agent.
    #[arg(long, env = "ADA_MODEL")]
    pub model: Option<String>,

    /// Data directory holding config.toml, the character card and memories.
    #[arg(long, env = "ADA_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to the persona character card (JSON).
    #[arg(long, env = "ADA_CHARACTER")]
    pub character: Option<PathBuf>,
}

impl ServeArgs {
    /// Apply every flag that was given on top of the file configuration.
    pub fn apply(&self, config: &mut RelayConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(character) = &self.character {
            config.character_path = Some(character.clone());
        }
    }
}
