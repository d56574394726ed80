use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tower::Layer;
use tracing::{error, info};

use http_exchange_recorder::app::AppService;
use http_exchange_recorder::capture::CaptureLayer;
use http_exchange_recorder::commands;
use http_exchange_recorder::config;
use http_exchange_recorder::error::Result;
use http_exchange_recorder::server::HttpServer;
use http_exchange_recorder::transport::{self, create_transports};

#[derive(Parser, Debug)]
#[command(name = "http-exchange-recorder")]
#[command(about = "Records HTTP request/response exchanges and publishes them to Kafka", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (TOML/JSON/YAML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Run the recording server (default)
    Run,
    /// Check configuration and test transport connections
    Check {
        /// Attempt to connect each configured transport
        #[arg(long)]
        probe: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("http_exchange_recorder={log_level}").parse().unwrap()),
        )
        .init();

    // Load configuration first
    let config = match args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match config::load_from_path(&path).await {
                Ok(cfg) => cfg,
                Err(e) => {
                    error!("Failed to load configuration from {}: {}", path.display(), e);
                    return Err(e);
                }
            }
        }
        None => {
            info!("Loading configuration from default locations");
            match config::load_from_env_or_file().await {
                Ok(cfg) => cfg,
                Err(e) => {
                    error!("Failed to load configuration: {}", e);
                    return Err(e);
                }
            }
        }
    };

    match args.command.unwrap_or(Command::Run) {
        Command::Check { probe } => {
            return commands::run_config_check(config, probe).await;
        }
        Command::Run => {
            info!("Starting HTTP Exchange Recorder");
        }
    }

    // Every transport must be connected before the first request is accepted;
    // traffic served without a mandatory transport would go unrecorded.
    let transports = transport::connect_all(
        create_transports(&config),
        config.capture.on_connect_failure,
    )
    .await?;
    info!(
        "Recording to {} transport(s), listening on {}:{}",
        transports.len(),
        config.server.host,
        config.server.port
    );

    let service = CaptureLayer::new(transports.clone()).layer(AppService::new());
    let server = HttpServer::bind(&config.server, service).await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run(shutdown_rx).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutting down HTTP Exchange Recorder");
    let _ = shutdown_tx.send(());

    // Graceful shutdown with timeout: stop accepting, then drain transports.
    let shutdown_timeout = tokio::time::timeout(tokio::time::Duration::from_secs(30), async {
        let _ = server_handle.await;
        transport::close_all(&transports).await;
    })
    .await;

    match shutdown_timeout {
        Ok(_) => {
            info!("Graceful shutdown completed");
        }
        Err(_) => {
            error!("Shutdown timeout exceeded, forcing exit");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
