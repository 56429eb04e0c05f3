// Main entry point - Dependency injection, scheduler and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{routing::get, Router};
use tokio::sync::watch;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::scheduler::Scheduler;
use crate::infrastructure::config::load_settings;
use crate::infrastructure::cwb_client::CwbForecastClient;
use crate::presentation::app_state::AppState;
use crate::presentation::chart_publisher::ChartPublisher;
use crate::presentation::handlers::{health_check, latest_chart, stream_chart};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration; a missing credential or location needs operator correction
    let settings = load_settings()?;
    if let Err(e) = settings.validate() {
        tracing::error!("{}", e);
        return Err(e.into());
    }

    // Forecast source (infrastructure layer)
    let source = Arc::new(CwbForecastClient::new(
        settings.api.clone(),
        settings.chart.elements.names(),
    )?);

    // Renderer shared with the HTTP surface
    let normalizer = settings.normalizer_config();
    let publisher = Arc::new(ChartPublisher::new(settings.chart.title.clone(), &normalizer));

    let scheduler = Scheduler::new(
        source,
        publisher.clone(),
        normalizer,
        settings.schedule_config(),
    );

    // Ctrl+C fans out to the scheduler and the server
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        } else {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        let _ = shutdown_tx.send(());
    });

    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx.clone()));

    let state = Arc::new(AppState {
        publisher,
        shutdown: shutdown_rx.clone(),
    });
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/chart", get(latest_chart).layer(CompressionLayer::new()))
        .route("/chart/stream", get(stream_chart))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = settings
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", settings.server.bind))?;
    tracing::info!("Starting weather-chart service on {}", addr);

    let mut server_shutdown = shutdown_rx;
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.changed().await;
        })
        .await?;

    scheduler_task.await?;

    Ok(())
}
