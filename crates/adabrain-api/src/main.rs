//! Ada Marie brain relay entry point.
//!
//! Binary name: `ada-brain`
//!
//! Parses CLI arguments, loads configuration, wires the relay, then serves
//! WebSocket clients until Ctrl+C or SIGTERM.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use adabrain_infra::config::{load_relay_config, resolve_data_dir};
use adabrain_observe::tracing_setup::{default_filter, init_tracing, shutdown_tracing};

use cli::{Cli, Commands, ServeArgs};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need logging or state
    let args = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(shell, &mut cmd, "ada-brain", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Serve(args) => args,
    };

    init_tracing(default_filter(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = serve(args).await;
    shutdown_tracing();
    result
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let data_dir = args.data_dir.clone().unwrap_or_else(resolve_data_dir);
    let mut config = load_relay_config(&data_dir).await;
    args.apply(&mut config);

    let state = AppState::init(config, data_dir).await?;
    let memory_ready = state.relay.memory().warm().await;

    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let check_mark = |ok: bool| {
        if ok {
            format!("{}", console::style("✓").green())
        } else {
            format!("{}", console::style("✗").red())
        }
    };

    println!();
    println!(
        "  {} {} brain relay listening on {}",
        console::style("🦄").bold(),
        console::style(state.relay.character().name()).magenta().bold(),
        console::style(format!("ws://{addr}")).cyan()
    );
    println!("  {} Model: {}", console::style("•").dim(), state.relay.agent().model());
    println!(
        "  {} Memory store: {}",
        check_mark(memory_ready),
        state.memory_db().display()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());
    println!();

    tracing::info!(
        %addr,
        model = state.relay.agent().model(),
        character = state.relay.character().name(),
        memory_ready,
        "Relay started"
    );

    let relay = std::sync::Arc::clone(&state.relay);
    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    relay.shutdown().await;
    tracing::info!("Relay stopped");
    println!("\n  Server stopped.");

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
///
/// A signal handler that cannot be installed never fires; the other one
/// still can.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
