//! Heartrisk: heart disease prediction API.
//!
//! Loads the trained artifact once and serves `POST /predict`.

use std::sync::Arc;

use anyhow::{Context, Result};

use heartrisk::adapters::JsonModelStore;
use heartrisk::application::PredictionService;
use heartrisk::config::ServeConfig;
use heartrisk::http::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = heartrisk::logging::init().context("failed to initialize logging")?;

    let config = ServeConfig::from_env()?;
    tracing::info!(model_dir = %config.model_dir.display(), "Starting Heartrisk...");

    let store = JsonModelStore::new(&config.model_dir);
    let service = PredictionService::load(&store).with_context(|| {
        format!(
            "failed to load model artifact from {}",
            config.model_dir.display()
        )
    })?;

    let state = Arc::new(AppState { service });
    http::serve(&config.bind_addr(), state)
        .await
        .with_context(|| format!("server on {} failed", config.bind_addr()))?;

    tracing::info!("Heartrisk shutdown complete.");
    Ok(())
}
