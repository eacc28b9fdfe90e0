//! HTTP surface of the prediction service.
//!
//! - `GET /` liveness check
//! - `POST /predict` scores `{"features": [13 numbers]}`; always answers 200
//!   with either a prediction or an `error` field

pub mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::application::PredictionService;

/// Shared, read-only request state.
pub struct AppState {
    pub service: PredictionService,
}

/// Largest accepted request body. A 13-number request is well under 1 KiB.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/predict", post(handlers::predict))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
///
/// # Errors
/// Returns error if the address cannot be bound or the server fails.
pub async fn serve(addr: &str, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Prediction API listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::warn!(error = %e, "Failed to listen for shutdown signal"),
    }
}
