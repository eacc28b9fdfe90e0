//! Gradient-boosted trees with logistic loss.
//!
//! Each round fits a depth-limited tree to the gradient and hessian of the
//! binary log-loss and adds its Newton-step leaves, scaled by the learning
//! rate, to the raw score.

use serde::{Deserialize, Serialize};

use super::tree::{self, GrowOptions, Targets, Tree};
use crate::domain::FeatureRow;
use crate::ports::{check_training_inputs, Classifier, ModelError, Trainer};

/// Training hyperparameters for boosting.
#[derive(Debug, Clone)]
pub struct BoostingOptions {
    /// Number of boosting rounds.
    pub n_estimators: usize,
    /// Maximum depth of each tree.
    pub max_depth: usize,
    /// Shrinkage applied to every tree.
    pub learning_rate: f64,
    /// L2 regularization on leaf values.
    pub lambda: f64,
    /// Minimum hessian sum per child.
    pub min_child_weight: f64,
}

impl Default for BoostingOptions {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: 4,
            learning_rate: 0.1,
            lambda: 1.0,
            min_child_weight: 1.0,
        }
    }
}

/// Fitted boosted ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtModel {
    pub model_version: i64,
    /// Initial raw score (log-odds of the training positive rate).
    pub base_score: f64,
    pub learning_rate: f64,
    pub trees: Vec<Tree>,
}

impl GbdtModel {
    /// Validate structural invariants of the model.
    ///
    /// # Errors
    /// Returns `ModelError::Invalid` for non-finite parameters or broken trees.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.base_score.is_finite() || !self.learning_rate.is_finite() {
            return Err(ModelError::Invalid(
                "base_score and learning_rate must be finite".to_string(),
            ));
        }
        for (idx, t) in self.trees.iter().enumerate() {
            t.validate()
                .map_err(|e| ModelError::Invalid(format!("round {idx}: {e}")))?;
        }
        Ok(())
    }

    /// Raw (log-odds) score for a row.
    #[must_use]
    pub fn predict_raw(&self, row: &FeatureRow) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |acc, t| acc + self.learning_rate * t.predict(row))
    }
}

impl Classifier for GbdtModel {
    fn predict_proba(&self, row: &FeatureRow) -> f64 {
        sigmoid(self.predict_raw(row))
    }
}

/// Logistic function.
#[must_use]
pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Second-order gradient boosting trainer.
#[derive(Debug, Clone, Default)]
pub struct GradientBoostingTrainer {
    pub options: BoostingOptions,
}

impl GradientBoostingTrainer {
    #[must_use]
    pub fn new(options: BoostingOptions) -> Self {
        Self { options }
    }
}

impl Trainer for GradientBoostingTrainer {
    type Model = GbdtModel;

    fn name(&self) -> &'static str {
        "XGBoost"
    }

    fn train(&self, x: &[FeatureRow], y: &[u8]) -> Result<GbdtModel, ModelError> {
        check_training_inputs(x, y)?;
        let opts = &self.options;
        let n = x.len();

        let positive_rate = y.iter().filter(|&&v| v == 1).count() as f64 / n as f64;
        let p0 = positive_rate.clamp(1e-6, 1.0 - 1e-6);
        let base_score = (p0 / (1.0 - p0)).ln();

        let grow_options = GrowOptions {
            max_depth: opts.max_depth,
            max_features: None,
        };

        let mut raw = vec![base_score; n];
        let mut grad = vec![0.0f64; n];
        let mut hess = vec![0.0f64; n];
        let mut trees = Vec::with_capacity(opts.n_estimators);

        for _round in 0..opts.n_estimators {
            for i in 0..n {
                let p = sigmoid(raw[i]);
                grad[i] = p - f64::from(y[i]);
                hess[i] = p * (1.0 - p);
            }
            let targets = Targets::Gradients {
                grad: &grad,
                hess: &hess,
                lambda: opts.lambda,
                min_child_weight: opts.min_child_weight,
            };
            let t = tree::grow(x, &targets, (0..n).collect(), grow_options, None);
            for i in 0..n {
                raw[i] += opts.learning_rate * t.predict(&x[i]);
            }
            trees.push(t);
        }

        tracing::debug!(
            rounds = trees.len(),
            max_depth = opts.max_depth,
            learning_rate = opts.learning_rate,
            "Gradient boosting fitted"
        );

        Ok(GbdtModel {
            model_version: 1,
            base_score,
            learning_rate: opts.learning_rate,
            trees,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NUM_FEATURES;

    fn threshold_data() -> (Vec<FeatureRow>, Vec<u8>) {
        let x: Vec<FeatureRow> = (0..40)
            .map(|i| {
                let mut row = [0.0; NUM_FEATURES];
                row[3] = i as f64;
                row[7] = ((i * 13) % 7) as f64;
                row
            })
            .collect();
        let y = (0..40).map(|i| u8::from(i >= 20)).collect();
        (x, y)
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn test_base_score_matches_prior() {
        let (x, y) = threshold_data();
        let model = GradientBoostingTrainer::new(BoostingOptions {
            n_estimators: 0,
            ..BoostingOptions::default()
        })
        .train(&x, &y)
        .expect("Should train");
        // Balanced labels: log-odds 0, probability 0.5 everywhere.
        assert!(model.base_score.abs() < 1e-9);
        assert!((model.predict_proba(&x[0]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_boosting_fits_threshold() {
        let (x, y) = threshold_data();
        let model = GradientBoostingTrainer::new(BoostingOptions {
            n_estimators: 50,
            ..BoostingOptions::default()
        })
        .train(&x, &y)
        .expect("Should train");
        assert!(model.validate().is_ok());

        for (row, &label) in x.iter().zip(&y) {
            assert_eq!(model.predict(row), label, "row {}", row[3]);
        }
        assert!(model.predict_proba(&x[39]) > 0.9);
        assert!(model.predict_proba(&x[0]) < 0.1);
    }

    #[test]
    fn test_boosting_rejects_mismatched_input() {
        let (x, _) = threshold_data();
        let err = GradientBoostingTrainer::default()
            .train(&x, &[0, 1])
            .expect_err("must fail");
        assert!(matches!(err, ModelError::MismatchedLengths { .. }));
    }
}
