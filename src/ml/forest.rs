//! Random forest classifier: bagged Gini trees with random feature subsets.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use super::tree::{self, GrowOptions, Targets, Tree};
use crate::domain::{FeatureRow, NUM_FEATURES};
use crate::ports::{check_training_inputs, Classifier, ModelError, Trainer};

/// Training hyperparameters for the forest.
#[derive(Debug, Clone)]
pub struct ForestOptions {
    /// Number of trees.
    pub n_estimators: usize,
    /// Maximum depth of each tree.
    pub max_depth: usize,
    /// Features examined per split; `None` uses `floor(sqrt(13))`.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 5,
            max_features: None,
            seed: 42,
        }
    }
}

/// Fitted random forest. The probability is the mean of the trees' leaf fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub model_version: i64,
    pub trees: Vec<Tree>,
}

impl ForestModel {
    /// Validate every tree of the forest.
    ///
    /// # Errors
    /// Returns `ModelError::Invalid` if the forest is empty or a tree is broken.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::Invalid("forest has no trees".to_string()));
        }
        for (idx, t) in self.trees.iter().enumerate() {
            t.validate()
                .map_err(|e| ModelError::Invalid(format!("tree {idx}: {e}")))?;
        }
        Ok(())
    }
}

impl Classifier for ForestModel {
    fn predict_proba(&self, row: &FeatureRow) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        sum / self.trees.len() as f64
    }
}

/// Bootstrap-aggregated decision tree trainer.
#[derive(Debug, Clone, Default)]
pub struct RandomForestTrainer {
    pub options: ForestOptions,
}

impl RandomForestTrainer {
    #[must_use]
    pub fn new(options: ForestOptions) -> Self {
        Self { options }
    }
}

impl Trainer for RandomForestTrainer {
    type Model = ForestModel;

    fn name(&self) -> &'static str {
        "RandomForest"
    }

    fn train(&self, x: &[FeatureRow], y: &[u8]) -> Result<ForestModel, ModelError> {
        check_training_inputs(x, y)?;
        let opts = &self.options;
        if opts.n_estimators == 0 {
            return Err(ModelError::Invalid("n_estimators must be > 0".to_string()));
        }

        let max_features = opts
            .max_features
            .unwrap_or_else(|| (NUM_FEATURES as f64).sqrt() as usize)
            .clamp(1, NUM_FEATURES);
        let grow_options = GrowOptions {
            max_depth: opts.max_depth,
            max_features: Some(max_features),
        };

        let n = x.len();
        let mut rng = ChaCha20Rng::seed_from_u64(opts.seed);
        let targets = Targets::Labels(y);
        let trees: Vec<Tree> = (0..opts.n_estimators)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                tree::grow(x, &targets, sample, grow_options, Some(&mut rng))
            })
            .collect();

        tracing::debug!(
            trees = trees.len(),
            max_depth = opts.max_depth,
            max_features,
            "Random forest fitted"
        );

        Ok(ForestModel {
            model_version: 1,
            trees,
        })
    }
}
