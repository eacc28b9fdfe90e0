//! Training use case: fit every classifier, evaluate it on the held-out
//! partition and persist the served model.

use std::sync::Arc;

use crate::adapters::StoreError;
use crate::ml::{
    BoostingOptions, EvaluationMetrics, ForestOptions, GradientBoostingTrainer, MlpOptions,
    ModelArtifact, NeuralNetworkTrainer, RandomForestTrainer, TrainedModel,
};
use crate::ports::{ModelStore, Trainer};
use crate::HeartriskError;

use super::preprocessing::PreparedData;

/// Hyperparameters of the three trainers.
#[derive(Debug, Clone, Default)]
pub struct TrainingOptions {
    pub forest: ForestOptions,
    pub boosting: BoostingOptions,
    pub network: MlpOptions,
}

impl TrainingOptions {
    /// Defaults with every seeded trainer using `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        let mut options = Self::default();
        options.forest.seed = seed;
        options.network.seed = seed;
        options
    }
}

/// Held-out metrics of one trained model.
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub name: &'static str,
    pub metrics: EvaluationMetrics,
}

impl std::fmt::Display for ModelReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.name, self.metrics)
    }
}

/// Outcome of a full training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// One entry per model, in training order.
    pub models: Vec<ModelReport>,
    /// Kind of the model written to the store.
    pub saved_model: &'static str,
}

/// Service running the offline training batch.
pub struct TrainingService<M>
where
    M: ModelStore,
{
    store: Arc<M>,
    options: TrainingOptions,
}

impl<M> TrainingService<M>
where
    M: ModelStore,
    M::Error: Into<StoreError>,
{
    pub fn new(store: Arc<M>, options: TrainingOptions) -> Self {
        Self { store, options }
    }

    /// Train the random forest, boosted trees and neural network in turn and
    /// save the neural network with the fitted scaler.
    ///
    /// # Errors
    /// Returns error if any trainer fails or the artifact cannot be saved.
    pub fn run(&self, data: &PreparedData) -> crate::Result<TrainingReport> {
        let mut models = Vec::with_capacity(3);

        let forest = RandomForestTrainer::new(self.options.forest.clone());
        models.push(fit_and_evaluate(&forest, data)?.0);

        let boosting = GradientBoostingTrainer::new(self.options.boosting.clone());
        models.push(fit_and_evaluate(&boosting, data)?.0);

        let network = NeuralNetworkTrainer::new(self.options.network.clone());
        let (report, model) = fit_and_evaluate(&network, data)?;
        let metrics = report.metrics;
        models.push(report);

        let artifact = ModelArtifact::new(TrainedModel::from(model), data.scaler, metrics);
        let saved_model = artifact.model.kind();
        self.store
            .save(&artifact)
            .map_err(|e| HeartriskError::Store(e.into()))?;

        Ok(TrainingReport {
            models,
            saved_model,
        })
    }
}

fn fit_and_evaluate<T: Trainer>(
    trainer: &T,
    data: &PreparedData,
) -> crate::Result<(ModelReport, T::Model)> {
    tracing::info!(model = trainer.name(), rows = data.x_train.len(), "Training model");
    let model = trainer.train(&data.x_train, &data.y_train)?;
    let metrics = EvaluationMetrics::evaluate(&model, &data.x_test, &data.y_test);
    tracing::info!(
        model = trainer.name(),
        accuracy = metrics.accuracy,
        auc = ?metrics.auc,
        label_auc = ?metrics.label_auc,
        "Model evaluated"
    );
    Ok((
        ModelReport {
            name: trainer.name(),
            metrics,
        },
        model,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::JsonModelStore;
    use crate::domain::{FeatureRow, LoadReport, StandardScaler, NUM_FEATURES};
    use crate::ports::Classifier;

    fn prepared() -> PreparedData {
        let row = |i: usize| -> (FeatureRow, u8) {
            let label = (i % 2) as u8;
            let mut r = [0.0; NUM_FEATURES];
            r[0] = if label == 1 { 1.0 } else { -1.0 } + (i % 3) as f64 * 0.1;
            r[4] = ((i * 5) % 9) as f64 / 9.0 - 0.5;
            (r, label)
        };
        let (x_train, y_train) = (0..40).map(row).unzip();
        let (x_test, y_test) = (40..50).map(row).unzip();
        PreparedData {
            x_train,
            x_test,
            y_train,
            y_test,
            scaler: StandardScaler {
                mean: [0.0; NUM_FEATURES],
                std: [1.0; NUM_FEATURES],
            },
            report: LoadReport::default(),
        }
    }

    fn fast_options() -> TrainingOptions {
        TrainingOptions {
            forest: ForestOptions {
                n_estimators: 10,
                ..ForestOptions::default()
            },
            boosting: BoostingOptions {
                n_estimators: 20,
                ..BoostingOptions::default()
            },
            network: MlpOptions {
                epochs: 40,
                learning_rate: 0.01,
                ..MlpOptions::default()
            },
        }
    }

    #[test]
    fn test_run_trains_three_models_and_saves_network() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = Arc::new(JsonModelStore::new(dir.path()));
        let service = TrainingService::new(Arc::clone(&store), fast_options());
        let data = prepared();

        let report = service.run(&data).expect("Should train");
        let names: Vec<&str> = report.models.iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["RandomForest", "XGBoost", "NeuralNetwork"]);
        assert_eq!(report.saved_model, "neural_network");
        for model in &report.models {
            assert_eq!(model.metrics.support, 10);
            assert!(model.metrics.accuracy >= 0.9, "{model}");
        }

        let artifact = store.load().expect("Should load saved artifact");
        let saved = artifact.metrics;
        let reported = report.models[2].metrics;
        assert!((saved.accuracy - reported.accuracy).abs() < 1e-12);
        assert_eq!(saved.support, reported.support);
        assert_eq!(artifact.scaler, data.scaler);
        let p = artifact.model.predict_proba(&data.x_test[0]);
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_report_line_format() {
        let report = ModelReport {
            name: "RandomForest",
            metrics: EvaluationMetrics {
                accuracy: 0.85,
                auc: Some(0.9123),
                label_auc: Some(0.9123),
                support: 61,
            },
        };
        assert_eq!(report.to_string(), "RandomForest -> Accuracy: 0.8500, AUC: 0.9123");
    }

    #[test]
    fn test_with_seed_applies_to_seeded_trainers() {
        let options = TrainingOptions::with_seed(7);
        assert_eq!(options.forest.seed, 7);
        assert_eq!(options.network.seed, 7);
    }
}
