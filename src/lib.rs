pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod services;
pub mod state;

use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use state::SharedState;

/// System user id stamped on rows written by CLI sync runs.
const SYSTEM_ACTOR: i32 = 1;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::SyncEmployees => {
            let shared = SharedState::new(config).await?;
            let report =
                services::sync::sync_employees(&shared.store, &shared.hr_directory, SYSTEM_ACTOR)
                    .await;
            println!(
                "{} fetched, {} created, {} updated, {} failures",
                report.fetched,
                report.created,
                report.updated,
                report.failures.len()
            );
            for failure in &report.failures {
                println!("  {}: {}", failure.scope, failure.error);
            }
            Ok(())
        }
        Commands::SyncCurrencies => {
            let shared = SharedState::new(config).await?;
            let report = services::sync::sync_currencies(
                &shared.store,
                &shared.currency_catalog,
                SYSTEM_ACTOR,
            )
            .await;
            println!(
                "{} fetched, {} created, {} updated, {} failures",
                report.fetched,
                report.created,
                report.updated,
                report.failures.len()
            );
            for failure in &report.failures {
                println!("  {}: {}", failure.scope, failure.error);
            }
            Ok(())
        }
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!(
        "plantdesk v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let port = config.server.port;
    let state = api::create_app_state_from_config(config).await?;
    let app = api::router(state).await;

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("API server running at http://0.0.0.0:{port}");
        if let Err(e) = axum::serve(listener, app).await {
            error!("API server error: {}", e);
        }
    });

    info!("Server running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    server_handle.abort();
    info!("Server stopped");

    Ok(())
}
