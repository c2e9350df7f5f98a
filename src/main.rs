// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava-Metrics API Server
//!
//! Serves time-series metrics over the configured athlete's Strava
//! activity history.

use anyhow::Context;
use std::sync::Arc;
use strava_metrics::{
    config::Config,
    services::{
        CancelToken, DatasetCache, MetricQueryCompiler, MetricsService, RefreshTokenProvider,
        StravaClient, StravaService,
    },
    time_utils::SystemClock,
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting Strava-Metrics API");

    // Strava client and credentials
    let client = StravaClient::from_config(&config);
    let credentials = Arc::new(RefreshTokenProvider::new(
        client.clone(),
        config.strava_refresh_token.clone(),
    ));
    let strava_service = StravaService::new(client, credentials);

    // Dataset cache (fetched lazily on first request)
    let cache = DatasetCache::new(Arc::new(strava_service), config.dataset_ttl);
    let cancel = cache.cancel_token();
    tracing::info!(ttl_secs = ?config.dataset_ttl.map(|d| d.as_secs()), "Dataset cache initialized");

    let metrics = MetricsService::new(cache, MetricQueryCompiler::new(Arc::new(SystemClock)));

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        metrics,
    });

    // Build router
    let app = strava_metrics::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await
        .context("Server error")?;
    Ok(())
}

/// Wait for ctrl-c, then stop any in-flight activity sync.
async fn shutdown_signal(cancel: CancelToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
    cancel.cancel();
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("strava_metrics=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
