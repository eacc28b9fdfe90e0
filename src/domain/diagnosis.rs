//! Prediction result types.
//!
//! Represents the output of a heart disease classifier for one patient.

use serde::{Deserialize, Serialize};

/// Probability above which a patient is labeled as having heart disease.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Binary prediction with the probability it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Binary prediction (0 = no disease, 1 = disease present)
    pub prediction: u8,

    /// Raw prediction probability (0.0 to 1.0)
    pub probability: f64,
}

impl Prediction {
    /// Create a prediction from a model probability.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        Self {
            prediction: u8::from(probability > DECISION_THRESHOLD),
            probability,
        }
    }
}

/// Reasons a single prediction request cannot be answered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Expected {expected} features, got {found}")]
    FeatureCount { expected: usize, found: usize },

    #[error("Feature '{0}' is not a finite number")]
    NonFinite(&'static str),

    #[error("Model produced an invalid probability: {0}")]
    InvalidProbability(f64),
}

/// Outcome of one prediction request.
pub type PredictionOutcome = Result<Prediction, PredictError>;
