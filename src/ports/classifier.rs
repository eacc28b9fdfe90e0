//! Classifier port: Traits for trained models and the procedures that fit them.
//!
//! Model internals stay behind these traits; the application layer only needs
//! "fit on labeled rows" and "score one scaled row".

use crate::domain::{FeatureRow, DECISION_THRESHOLD};

/// Errors that can occur while fitting or validating a model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Empty training set")]
    EmptyTrainingSet,

    #[error("Mismatched training inputs: {features} feature rows, {labels} labels")]
    MismatchedLengths { features: usize, labels: usize },

    #[error("Invalid label {0} (expected 0 or 1)")]
    InvalidLabel(u8),

    #[error("Invalid model: {0}")]
    Invalid(String),
}

/// A fitted binary classifier over scaled feature rows.
pub trait Classifier: Send + Sync {
    /// Probability that the row belongs to the positive (disease) class.
    fn predict_proba(&self, row: &FeatureRow) -> f64;

    /// Binary label at the fixed decision threshold.
    fn predict(&self, row: &FeatureRow) -> u8 {
        u8::from(self.predict_proba(row) > DECISION_THRESHOLD)
    }
}

/// A training procedure producing a [`Classifier`].
pub trait Trainer {
    /// The model type this trainer produces.
    type Model: Classifier;

    /// Display name used in logs and metric reports.
    fn name(&self) -> &'static str;

    /// Fit a model on scaled rows and binary labels.
    ///
    /// # Errors
    /// Returns `ModelError` if the inputs cannot be trained on.
    fn train(&self, x: &[FeatureRow], y: &[u8]) -> Result<Self::Model, ModelError>;
}

/// Shared input validation for trainers.
///
/// # Errors
/// Returns `ModelError` for empty, mismatched or non-binary inputs.
pub fn check_training_inputs(x: &[FeatureRow], y: &[u8]) -> Result<(), ModelError> {
    if x.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if x.len() != y.len() {
        return Err(ModelError::MismatchedLengths {
            features: x.len(),
            labels: y.len(),
        });
    }
    if let Some(&bad) = y.iter().find(|&&label| label > 1) {
        return Err(ModelError::InvalidLabel(bad));
    }
    Ok(())
}
