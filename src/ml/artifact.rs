//! Persisted model artifact: the fitted classifier bundled with the scaler
//! it was trained behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::forest::ForestModel;
use super::gbdt::GbdtModel;
use super::metrics::EvaluationMetrics;
use super::mlp::MlpModel;
use crate::domain::{FeatureRow, StandardScaler, FEATURE_NAMES};
use crate::ports::{Classifier, ModelError};

/// Artifact schema version written by this build.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Any of the supported fitted models.
///
/// Training saves the neural network, but an artifact holding any trainer's
/// model loads, validates and scores the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    RandomForest(ForestModel),
    GradientBoosting(GbdtModel),
    NeuralNetwork(MlpModel),
}

impl TrainedModel {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RandomForest(_) => "random_forest",
            Self::GradientBoosting(_) => "gradient_boosting",
            Self::NeuralNetwork(_) => "neural_network",
        }
    }

    /// # Errors
    /// Returns `ModelError::Invalid` if the wrapped model is malformed.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::RandomForest(m) => m.validate(),
            Self::GradientBoosting(m) => m.validate(),
            Self::NeuralNetwork(m) => m.validate(),
        }
    }
}

impl Classifier for TrainedModel {
    fn predict_proba(&self, row: &FeatureRow) -> f64 {
        match self {
            Self::RandomForest(m) => m.predict_proba(row),
            Self::GradientBoosting(m) => m.predict_proba(row),
            Self::NeuralNetwork(m) => m.predict_proba(row),
        }
    }
}

impl From<ForestModel> for TrainedModel {
    fn from(model: ForestModel) -> Self {
        Self::RandomForest(model)
    }
}

impl From<GbdtModel> for TrainedModel {
    fn from(model: GbdtModel) -> Self {
        Self::GradientBoosting(model)
    }
}

impl From<MlpModel> for TrainedModel {
    fn from(model: MlpModel) -> Self {
        Self::NeuralNetwork(model)
    }
}

/// Everything the prediction service needs to score raw feature vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    /// Feature order the model expects.
    pub feature_names: Vec<String>,
    /// Scaler fitted on the training partition; applied before scoring.
    pub scaler: StandardScaler,
    pub model: TrainedModel,
    /// Held-out metrics recorded at training time.
    pub metrics: EvaluationMetrics,
}

impl ModelArtifact {
    #[must_use]
    pub fn new(model: TrainedModel, scaler: StandardScaler, metrics: EvaluationMetrics) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            created_at: Utc::now(),
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            scaler,
            model,
            metrics,
        }
    }

    /// Check the artifact is usable for scoring.
    ///
    /// # Errors
    /// Returns `ModelError::Invalid` on version, feature-order, scaler or
    /// model inconsistencies.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::Invalid(format!(
                "unsupported artifact format {} (expected {ARTIFACT_FORMAT_VERSION})",
                self.format_version
            )));
        }
        if self.feature_names.len() != FEATURE_NAMES.len()
            || self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES)
                .any(|(a, b)| a != b)
        {
            return Err(ModelError::Invalid("feature order mismatch".to_string()));
        }
        self.scaler.validate().map_err(ModelError::Invalid)?;
        self.model.validate()
    }

    /// Scale a raw row and score it.
    #[must_use]
    pub fn score(&self, raw: &FeatureRow) -> f64 {
        self.model.predict_proba(&self.scaler.transform_row(raw))
    }
}
