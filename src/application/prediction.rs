//! Prediction service: scores raw feature vectors with the loaded artifact.

use crate::adapters::StoreError;
use crate::domain::{ClinicalFeatures, PredictError, Prediction, PredictionOutcome, NUM_FEATURES};
use crate::ml::ModelArtifact;
use crate::ports::ModelStore;

/// Immutable service context built once at startup.
///
/// Holds the validated artifact; every request reads it without locking.
#[derive(Debug, Clone)]
pub struct PredictionService {
    artifact: ModelArtifact,
}

impl PredictionService {
    /// Load and validate the persisted artifact.
    ///
    /// # Errors
    /// Returns `StoreError` if the artifact is missing, fails its integrity
    /// check or is malformed.
    pub fn load<M>(store: &M) -> Result<Self, StoreError>
    where
        M: ModelStore,
        M::Error: Into<StoreError>,
    {
        let artifact = store.load().map_err(Into::<StoreError>::into)?;
        Self::from_artifact(artifact)
    }

    /// Wrap an in-memory artifact.
    ///
    /// # Errors
    /// Returns `StoreError::Invalid` if the artifact fails validation.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, StoreError> {
        artifact
            .validate()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        tracing::info!(
            model = artifact.model.kind(),
            created_at = %artifact.created_at,
            "Prediction service ready"
        );
        Ok(Self { artifact })
    }

    #[must_use]
    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Score one raw (unscaled) feature vector.
    ///
    /// The artifact's scaler is applied before the model sees the row.
    pub fn predict(&self, features: &[f64]) -> PredictionOutcome {
        let parsed = ClinicalFeatures::from_slice(features).map_err(|found| {
            PredictError::FeatureCount {
                expected: NUM_FEATURES,
                found,
            }
        })?;
        if let Some(name) = parsed.first_non_finite() {
            return Err(PredictError::NonFinite(name));
        }

        let probability = self.artifact.score(&parsed.to_row());
        if !(probability.is_finite() && (0.0..=1.0).contains(&probability)) {
            tracing::warn!(probability, "Model produced an invalid probability");
            return Err(PredictError::InvalidProbability(probability));
        }

        let prediction = Prediction::from_probability(probability);
        tracing::debug!(
            prediction = prediction.prediction,
            probability = prediction.probability,
            "Prediction served"
        );
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::JsonModelStore;
    use crate::domain::StandardScaler;
    use crate::ml::mlp::DenseLayer;
    use crate::ml::{EvaluationMetrics, MlpModel};

    /// Network whose logit is `2 * scaled_age`.
    fn age_artifact() -> ModelArtifact {
        let mut hidden = DenseLayer::zeros(NUM_FEATURES, 2);
        hidden.weights[0] = 1.0;
        hidden.weights[NUM_FEATURES] = -1.0;
        let mut output = DenseLayer::zeros(2, 1);
        output.weights = vec![2.0, -2.0];
        let model = MlpModel {
            model_version: 1,
            layers: vec![hidden, output],
        };
        let mut scaler = StandardScaler {
            mean: [0.0; NUM_FEATURES],
            std: [1.0; NUM_FEATURES],
        };
        scaler.mean[0] = 50.0;
        scaler.std[0] = 10.0;
        let metrics = EvaluationMetrics {
            accuracy: 1.0,
            auc: Some(1.0),
            label_auc: Some(1.0),
            support: 4,
        };
        ModelArtifact::new(model.into(), scaler, metrics)
    }

    fn features(age: f64) -> Vec<f64> {
        let mut v = vec![0.0; NUM_FEATURES];
        v[0] = age;
        v
    }

    #[test]
    fn test_predict_applies_scaler() {
        let service = PredictionService::from_artifact(age_artifact()).expect("Should build");

        let old = service.predict(&features(70.0)).expect("Should predict");
        // scaled age = 2, logit = 4
        let expected = 1.0 / (1.0 + (-4.0f64).exp());
        assert!((old.probability - expected).abs() < 1e-12);
        assert_eq!(old.prediction, 1);

        let young = service.predict(&features(30.0)).expect("Should predict");
        assert!(young.probability < 0.5);
        assert_eq!(young.prediction, 0);
    }

    #[test]
    fn test_mean_row_is_not_positive() {
        // Probability exactly 0.5 is below the strict threshold.
        let service = PredictionService::from_artifact(age_artifact()).expect("Should build");
        let p = service.predict(&features(50.0)).expect("Should predict");
        assert!((p.probability - 0.5).abs() < 1e-12);
        assert_eq!(p.prediction, 0);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let service = PredictionService::from_artifact(age_artifact()).expect("Should build");
        assert_eq!(
            service.predict(&[1.0, 2.0]),
            Err(PredictError::FeatureCount {
                expected: 13,
                found: 2
            })
        );
        assert!(matches!(
            service.predict(&[0.0; 14]),
            Err(PredictError::FeatureCount { found: 14, .. })
        ));
    }

    #[test]
    fn test_non_finite_feature_is_rejected() {
        let service = PredictionService::from_artifact(age_artifact()).expect("Should build");
        let mut v = features(60.0);
        v[4] = f64::NAN;
        assert_eq!(service.predict(&v), Err(PredictError::NonFinite("chol")));
    }

    #[test]
    fn test_load_from_store() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = JsonModelStore::new(dir.path());
        store.save(&age_artifact()).expect("Should save");

        let service = PredictionService::load(&store).expect("Should load");
        let p = service.predict(&features(70.0)).expect("Should predict");
        assert_eq!(p.prediction, 1);
    }

    #[test]
    fn test_load_fails_without_artifact() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = JsonModelStore::new(dir.path());
        assert!(matches!(
            PredictionService::load(&store),
            Err(StoreError::Missing(_))
        ));
    }
}
