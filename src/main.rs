//! Account Service
//!
//! Manages accounts and their beneficiaries behind a role-authorized HTTP API.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id / trace / timeout / body limit
//!                         │
//!                         ▼
//!                   access control ── 401 (no or bad credentials)
//!                         │        └─ 403 (no rule, or missing role)
//!                         ▼
//!                   route observers (account.list → metrics counter)
//!                         │
//!                         ▼
//!                     handlers ──▶ AccountManager ──▶ ObservedStore ──▶ InMemoryAccountStore
//!                         │                           (store.* → logging observer)
//!                         ▼
//!     Client Response ◀── ApiError / JSON
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use account_service::config::{load_config, ConfigWatcher, ServiceConfig};
use account_service::http::HttpServer;
use account_service::lifecycle::{report_account_count, seed_accounts, wait_for_signal, Shutdown};
use account_service::observability::{logging::init_logging, metrics::init_metrics};

#[derive(Parser)]
#[command(name = "account-service")]
#[command(about = "Account and beneficiary service", long_about = None)]
struct Args {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability);
    tracing::info!("account-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        users = config.security.users.len(),
        seed_accounts = config.seed.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let seeds = config.seed.clone();
    let server = HttpServer::new(config.clone())?;
    seed_accounts(server.manager(), &seeds).await?;
    report_account_count(server.manager()).await?;

    // Hot reload of the user registry.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move { wait_for_signal(&shutdown).await });

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
