//! Request handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::{PredictError, Prediction};

/// Body of the liveness check.
pub const READY_MESSAGE: &str = "Heart Disease Prediction API is running!";

/// Expected body of `POST /predict`.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
}

/// Body of every `/predict` response.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PredictResponse {
    Prediction(Prediction),
    Error { error: String },
}

impl From<Result<Prediction, PredictError>> for PredictResponse {
    fn from(outcome: Result<Prediction, PredictError>) -> Self {
        match outcome {
            Ok(p) => Self::Prediction(p),
            Err(e) => Self::Error {
                error: e.to_string(),
            },
        }
    }
}

/// `GET /`
pub async fn home() -> &'static str {
    READY_MESSAGE
}

/// `POST /predict`
///
/// The body is parsed here rather than through the `Json` extractor so
/// malformed requests still get a 200 with an `error` field. A body that
/// cannot be buffered (over the size limit, broken stream) is reported the
/// same way.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Json<PredictResponse> {
    let outcome = body
        .map_err(|e| PredictError::MalformedRequest(e.body_text()))
        .and_then(|body| {
            serde_json::from_slice::<PredictRequest>(&body)
                .map_err(|e| PredictError::MalformedRequest(e.to_string()))
        })
        .and_then(|req| state.service.predict(&req.features));

    if let Err(e) = &outcome {
        tracing::debug!(error = %e, "Prediction request rejected");
    }
    Json(outcome.into())
}
