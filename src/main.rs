//! F1 Analytics API
//!
//! REST API and CLI over the cleaned 1950-2020 Formula 1 dataset.

mod championship;
mod circuits;
mod cli;
mod config;
mod dataset;
mod drivers;
mod enrich;
mod pace;
mod pits;
mod report;
mod routes;
mod types;

use axum::{routing::get, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::dataset::TableStore;
use crate::enrich::FinishPolicy;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => run_server(Some(host), Some(port)).await,
        Commands::Summary { format } => cli::run_summary(format).await,
        Commands::Drivers {
            min_races,
            top,
            format,
        } => cli::run_drivers(min_races, top, format).await,
        Commands::Championship { year, top, format } => {
            cli::run_championship(year, top, format).await
        }
        Commands::Pace {
            race_id,
            drivers,
            window,
            format,
        } => cli::run_pace(race_id, drivers, window, format).await,
        Commands::Report { out } => cli::run_report(out).await,
    }
}

/// Run the API server.
async fn run_server(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "f1_analytics=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut config = AppConfig::load()?;

    // Override with CLI args
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("Results table: {}", config.data.results_path);

    let store = TableStore::from_config(&config.data);
    let policy = FinishPolicy::new(config.analytics.finished_status_ids.iter().copied());

    // Warm the results cache. A missing table is logged, not fatal, so the
    // server can come up before the dataset lands.
    match store.results() {
        Ok(rows) => tracing::info!("Results ready: {} rows", rows.len()),
        Err(e) => tracing::warn!("Results not loaded at startup: {}", e),
    }

    // Create application state
    let state = Arc::new(AppState {
        store,
        config: config.clone(),
        policy,
    });

    // Build router
    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/summary", get(routes::summary))
        .route("/drivers", get(routes::drivers))
        .route("/pits", get(routes::pits))
        .route("/circuits", get(routes::circuits))
        .route("/championship/{year}", get(routes::championship))
        .route("/pace/{race_id}", get(routes::pace))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
