//! HTTP proxy server startup and routes.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use dashboard_core::{Config, WeatherProxy};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ServerState {
    proxy: Arc<WeatherProxy>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    location: Option<String>,
}

pub fn router(proxy: WeatherProxy) -> Router {
    let state = ServerState {
        proxy: Arc::new(proxy),
    };

    Router::new()
        .route("/api/weather", get(weather))
        .with_state(state)
}

async fn weather(
    State(state): State<ServerState>,
    Query(query): Query<WeatherQuery>,
) -> (StatusCode, Json<Value>) {
    let reply = state.proxy.forward(query.location.as_deref()).await;
    (reply.status, Json(reply.body))
}

pub async fn serve(config: &Config, bind: Option<&str>) -> anyhow::Result<()> {
    let addr = bind.unwrap_or(&config.server.bind);
    let proxy = WeatherProxy::from_config(config);

    if !proxy.is_configured() {
        tracing::warn!(
            "No upstream API key configured; /api/weather will answer 503. \
             Run `weather-dashboard configure` or set WEATHER_API_KEY."
        );
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Weather proxy listening on {}", listener.local_addr()?);

    axum::serve(listener, router(proxy))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Weather proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
