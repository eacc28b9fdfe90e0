//! Feed-forward neural network classifier.
//!
//! ReLU hidden layers followed by a single sigmoid output unit.

mod train;

use serde::{Deserialize, Serialize};

pub use train::{MlpOptions, NeuralNetworkTrainer};

use super::gbdt::sigmoid;
use crate::domain::{FeatureRow, NUM_FEATURES};
use crate::ports::{Classifier, ModelError};

/// Fully connected layer with row-major `[outputs][inputs]` weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub inputs: usize,
    pub outputs: usize,
    pub weights: Vec<f64>,
    pub bias: Vec<f64>,
}

impl DenseLayer {
    /// Zero-initialized layer.
    #[must_use]
    pub fn zeros(inputs: usize, outputs: usize) -> Self {
        Self {
            inputs,
            outputs,
            weights: vec![0.0; inputs * outputs],
            bias: vec![0.0; outputs],
        }
    }

    /// Affine transform `W x + b` written into `out`.
    pub fn forward(&self, input: &[f64], out: &mut Vec<f64>) {
        out.clear();
        for o in 0..self.outputs {
            let base = o * self.inputs;
            let mut sum = self.bias[o];
            for i in 0..self.inputs {
                sum += self.weights[base + i] * input[i];
            }
            out.push(sum);
        }
    }
}

/// Fitted network. The last layer must have a single output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpModel {
    pub model_version: i64,
    pub layers: Vec<DenseLayer>,
}

impl MlpModel {
    /// Validate layer shapes and parameter values.
    ///
    /// # Errors
    /// Returns `ModelError::Invalid` describing the first inconsistency.
    pub fn validate(&self) -> Result<(), ModelError> {
        let Some(first) = self.layers.first() else {
            return Err(ModelError::Invalid("network has no layers".to_string()));
        };
        if first.inputs != NUM_FEATURES {
            return Err(ModelError::Invalid(format!(
                "input layer expects {} features (expected {NUM_FEATURES})",
                first.inputs
            )));
        }
        let mut expected_inputs = NUM_FEATURES;
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.inputs != expected_inputs {
                return Err(ModelError::Invalid(format!(
                    "layer {idx} takes {} inputs but the previous layer emits {expected_inputs}",
                    layer.inputs
                )));
            }
            if layer.weights.len() != layer.inputs * layer.outputs {
                return Err(ModelError::Invalid(format!("layer {idx} weights length mismatch")));
            }
            if layer.bias.len() != layer.outputs {
                return Err(ModelError::Invalid(format!("layer {idx} bias length mismatch")));
            }
            if layer
                .weights
                .iter()
                .chain(&layer.bias)
                .any(|v| !v.is_finite())
            {
                return Err(ModelError::Invalid(format!(
                    "layer {idx} has non-finite parameters"
                )));
            }
            expected_inputs = layer.outputs;
        }
        if expected_inputs != 1 {
            return Err(ModelError::Invalid(format!(
                "output layer has {expected_inputs} units (expected 1)"
            )));
        }
        Ok(())
    }

    /// Activations of every layer for one row; entry 0 is the input itself.
    pub(crate) fn forward_all(&self, row: &[f64]) -> Vec<Vec<f64>> {
        let mut acts = Vec::with_capacity(self.layers.len() + 1);
        acts.push(row.to_vec());
        let last = self.layers.len().saturating_sub(1);
        for (idx, layer) in self.layers.iter().enumerate() {
            let mut out = Vec::with_capacity(layer.outputs);
            layer.forward(&acts[idx], &mut out);
            if idx == last {
                for v in &mut out {
                    *v = sigmoid(*v);
                }
            } else {
                for v in &mut out {
                    *v = v.max(0.0);
                }
            }
            acts.push(out);
        }
        acts
    }
}

impl Classifier for MlpModel {
    fn predict_proba(&self, row: &FeatureRow) -> f64 {
        self.forward_all(row)
            .last()
            .and_then(|out| out.first().copied())
            .unwrap_or(0.0)
    }
}
