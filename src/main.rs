//! SQL Gateway
//!
//! Serves HTTP routes whose handlers are SQL statements declared in a
//! config file.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ routing::RouterContext
//!                                           │ resolve params
//!                                           ▼
//!                                      query::executor ──▶ db pool ──▶ SQLite
//!                                           │
//!     Client Response                       ▼
//!     ◀────────────── http::response ◀── rows / typed error
//!
//!     Cross-cutting: config, observability, lifecycle, resilience
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use sql_gateway::config::load_config;
use sql_gateway::lifecycle::{start, Shutdown, StartupError};
use sql_gateway::observability::{init_logging, init_metrics};

#[derive(Debug, Parser)]
#[command(name = "sql-gateway", version, about = "Serve SQL statements over HTTP")]
struct Cli {
    /// Path to the YAML or TOML config file.
    config: PathBuf,

    /// Port to listen on, overriding the config file and `PORT`.
    #[arg(long)]
    port: Option<u16>,

    /// Log level, overriding the config file.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("sql-gateway: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let mut config = load_config(&cli.config)?;
    if let Some(port) = cli.port {
        config.settings.port = port;
    }
    if let Some(level) = cli.log_level {
        config.settings.observability.log_level = level;
    }

    let observability = config.settings.observability.clone();
    init_logging(&observability.log_level, observability.log_format);

    tracing::info!("sql-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config = %cli.config.display(),
        db = %config.settings.db.filepath,
        rules = config.rules.len(),
        request_timeout_secs = config.settings.timeouts.request_secs,
        "Configuration loaded"
    );

    if observability.metrics_enabled {
        let addr = observability.metrics_address.parse().map_err(|e| {
            StartupError::Metrics(format!(
                "invalid metrics address `{}`: {}",
                observability.metrics_address, e
            ))
        })?;
        init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    let bind_address = config.settings.bind_address();
    let server = start(config).await?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signals = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, signals).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
