#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
mod generate;
mod server;

use args::{Args, Command};
use banana_config::Config;
use clap::Parser;
use server::Server;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize telemetry
    banana_telemetry::init(&config.telemetry)?;

    match args.command.unwrap_or(Command::Serve { listen: None }) {
        Command::Serve { listen } => serve(&args.config, &config, listen).await,
        Command::Generate(generate) => generate::run(&config, generate).await,
    }
}

async fn serve(
    config_path: &std::path::Path,
    config: &Config,
    listen: Option<std::net::SocketAddr>,
) -> anyhow::Result<()> {
    tracing::info!(
        config_path = %config_path.display(),
        "starting banana"
    );

    let server = Server::new(config, listen)?;

    // Set up graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    server.serve(shutdown).await?;

    tracing::info!("banana stopped");
    Ok(())
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
