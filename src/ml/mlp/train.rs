//! Mini-batch Adam training of the network on binary cross-entropy.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::{DenseLayer, MlpModel};
use crate::domain::{FeatureRow, NUM_FEATURES};
use crate::ports::{check_training_inputs, ModelError, Trainer};

/// Training options for the network.
#[derive(Debug, Clone)]
pub struct MlpOptions {
    /// Units of each ReLU hidden layer.
    pub hidden_sizes: Vec<usize>,
    pub epochs: usize,
    pub batch_size: usize,
    /// Adam step size.
    pub learning_rate: f64,
    /// Fraction of the training rows (taken from the end) held out for
    /// per-epoch validation loss.
    pub validation_split: f64,
    pub seed: u64,
}

impl Default for MlpOptions {
    fn default() -> Self {
        Self {
            hidden_sizes: vec![32, 16],
            epochs: 20,
            batch_size: 16,
            learning_rate: 0.001,
            validation_split: 0.2,
            seed: 42,
        }
    }
}

/// Mini-batch Adam trainer minimizing binary cross-entropy.
#[derive(Debug, Clone, Default)]
pub struct NeuralNetworkTrainer {
    pub options: MlpOptions,
}

impl NeuralNetworkTrainer {
    #[must_use]
    pub fn new(options: MlpOptions) -> Self {
        Self { options }
    }
}

impl Trainer for NeuralNetworkTrainer {
    type Model = MlpModel;

    fn name(&self) -> &'static str {
        "NeuralNetwork"
    }

    fn train(&self, x: &[FeatureRow], y: &[u8]) -> Result<MlpModel, ModelError> {
        check_training_inputs(x, y)?;
        train_mlp(x, y, &self.options)
    }
}

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-7;

/// First and second moment estimates for one layer.
struct AdamState {
    m_w: Vec<f64>,
    v_w: Vec<f64>,
    m_b: Vec<f64>,
    v_b: Vec<f64>,
}

impl AdamState {
    fn for_layer(layer: &DenseLayer) -> Self {
        Self {
            m_w: vec![0.0; layer.weights.len()],
            v_w: vec![0.0; layer.weights.len()],
            m_b: vec![0.0; layer.bias.len()],
            v_b: vec![0.0; layer.bias.len()],
        }
    }
}

fn adam_step(params: &mut [f64], grads: &[f64], m: &mut [f64], v: &mut [f64], lr_t: f64) {
    for i in 0..params.len() {
        m[i] = ADAM_BETA1 * m[i] + (1.0 - ADAM_BETA1) * grads[i];
        v[i] = ADAM_BETA2 * v[i] + (1.0 - ADAM_BETA2) * grads[i] * grads[i];
        params[i] -= lr_t * m[i] / (v[i].sqrt() + ADAM_EPSILON);
    }
}

fn glorot_uniform<R: Rng>(inputs: usize, outputs: usize, rng: &mut R) -> DenseLayer {
    let limit = (6.0 / (inputs + outputs) as f64).sqrt();
    let mut layer = DenseLayer::zeros(inputs, outputs);
    for w in &mut layer.weights {
        *w = rng.gen_range(-limit..limit);
    }
    layer
}

fn binary_cross_entropy(p: f64, y: f64) -> f64 {
    let p = p.clamp(1e-7, 1.0 - 1e-7);
    -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
}

fn mean_loss(model: &MlpModel, x: &[FeatureRow], y: &[u8]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let total: f64 = x
        .iter()
        .zip(y)
        .map(|(row, &label)| {
            let p = model
                .forward_all(row)
                .last()
                .and_then(|out| out.first().copied())
                .unwrap_or(0.5);
            binary_cross_entropy(p, f64::from(label))
        })
        .sum();
    total / x.len() as f64
}

fn train_mlp(x: &[FeatureRow], y: &[u8], options: &MlpOptions) -> Result<MlpModel, ModelError> {
    if options.hidden_sizes.iter().any(|&h| h == 0) {
        return Err(ModelError::Invalid("hidden layers must have units".to_string()));
    }
    if !(0.0..1.0).contains(&options.validation_split) {
        return Err(ModelError::Invalid(format!(
            "validation_split {} must be in [0, 1)",
            options.validation_split
        )));
    }

    let n = x.len();
    let n_fit = ((n as f64) * (1.0 - options.validation_split)) as usize;
    if n_fit == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }
    let (x_fit, x_val) = x.split_at(n_fit);
    let (y_fit, y_val) = y.split_at(n_fit);

    let mut rng = ChaCha20Rng::seed_from_u64(options.seed);
    let mut sizes = vec![NUM_FEATURES];
    sizes.extend(&options.hidden_sizes);
    sizes.push(1);
    let mut model = MlpModel {
        model_version: 1,
        layers: sizes
            .windows(2)
            .map(|w| glorot_uniform(w[0], w[1], &mut rng))
            .collect(),
    };
    let mut adam: Vec<AdamState> = model.layers.iter().map(AdamState::for_layer).collect();
    let mut step = 0i32;

    let batch_size = options.batch_size.max(1);
    let n_layers = model.layers.len();
    let mut indices: Vec<usize> = (0..n_fit).collect();

    for epoch in 0..options.epochs {
        indices.shuffle(&mut rng);
        for batch in indices.chunks(batch_size) {
            let mut grad_w: Vec<Vec<f64>> =
                model.layers.iter().map(|l| vec![0.0; l.weights.len()]).collect();
            let mut grad_b: Vec<Vec<f64>> =
                model.layers.iter().map(|l| vec![0.0; l.bias.len()]).collect();

            for &idx in batch {
                let acts = model.forward_all(&x_fit[idx]);
                // Sigmoid output with cross-entropy: dL/dz = p - y.
                let mut delta = vec![acts[n_layers][0] - f64::from(y_fit[idx])];

                for l in (0..n_layers).rev() {
                    let layer = &model.layers[l];
                    let input = &acts[l];
                    for o in 0..layer.outputs {
                        let base = o * layer.inputs;
                        for i in 0..layer.inputs {
                            grad_w[l][base + i] += delta[o] * input[i];
                        }
                        grad_b[l][o] += delta[o];
                    }
                    if l > 0 {
                        let mut prev = vec![0.0; layer.inputs];
                        for (i, p) in prev.iter_mut().enumerate() {
                            // ReLU derivative on the previous layer's output.
                            if input[i] <= 0.0 {
                                continue;
                            }
                            for o in 0..layer.outputs {
                                *p += layer.weights[o * layer.inputs + i] * delta[o];
                            }
                        }
                        delta = prev;
                    }
                }
            }

            let inv = 1.0 / batch.len() as f64;
            step += 1;
            let lr_t = options.learning_rate * (1.0 - ADAM_BETA2.powi(step)).sqrt()
                / (1.0 - ADAM_BETA1.powi(step));
            for l in 0..n_layers {
                for g in grad_w[l].iter_mut().chain(grad_b[l].iter_mut()) {
                    *g *= inv;
                }
                let state = &mut adam[l];
                let layer = &mut model.layers[l];
                adam_step(&mut layer.weights, &grad_w[l], &mut state.m_w, &mut state.v_w, lr_t);
                adam_step(&mut layer.bias, &grad_b[l], &mut state.m_b, &mut state.v_b, lr_t);
            }
        }

        tracing::debug!(
            epoch = epoch + 1,
            loss = mean_loss(&model, x_fit, y_fit),
            val_loss = mean_loss(&model, x_val, y_val),
            "Neural network epoch complete"
        );
    }

    model.validate()?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Classifier;

    fn separable(n: usize) -> (Vec<FeatureRow>, Vec<u8>) {
        (0..n)
            .map(|i| {
                let label = (i % 2) as u8;
                let mut row = [0.0; NUM_FEATURES];
                row[0] = if label == 1 { 1.5 } else { -1.5 };
                row[1] = ((i % 7) as f64 - 3.0) / 3.0;
                (row, label)
            })
            .unzip()
    }

    #[test]
    fn test_default_architecture() {
        let (x, y) = separable(20);
        let model = NeuralNetworkTrainer::new(MlpOptions {
            epochs: 1,
            ..MlpOptions::default()
        })
        .train(&x, &y)
        .expect("Should train");

        let shapes: Vec<(usize, usize)> =
            model.layers.iter().map(|l| (l.inputs, l.outputs)).collect();
        assert_eq!(shapes, vec![(13, 32), (32, 16), (16, 1)]);
    }

    #[test]
    fn test_network_learns_separable_data() {
        let (x, y) = separable(80);
        let model = NeuralNetworkTrainer::new(MlpOptions {
            epochs: 60,
            learning_rate: 0.01,
            ..MlpOptions::default()
        })
        .train(&x, &y)
        .expect("Should train");

        let correct = x
            .iter()
            .zip(&y)
            .filter(|(row, &label)| model.predict(row) == label)
            .count();
        assert_eq!(correct, x.len());
    }

    #[test]
    fn test_training_is_deterministic_per_seed() {
        let (x, y) = separable(30);
        let trainer = NeuralNetworkTrainer::new(MlpOptions {
            epochs: 3,
            ..MlpOptions::default()
        });
        let a = trainer.train(&x, &y).expect("Should train");
        let b = trainer.train(&x, &y).expect("Should train");
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_options() {
        let (x, y) = separable(10);
        let err = NeuralNetworkTrainer::new(MlpOptions {
            hidden_sizes: vec![8, 0],
            ..MlpOptions::default()
        })
        .train(&x, &y)
        .expect_err("must fail");
        assert!(matches!(err, ModelError::Invalid(_)));

        let err = NeuralNetworkTrainer::new(MlpOptions {
            validation_split: 1.0,
            ..MlpOptions::default()
        })
        .train(&x, &y)
        .expect_err("must fail");
        assert!(matches!(err, ModelError::Invalid(_)));
    }

    #[test]
    fn test_bce_is_clamped() {
        assert!(binary_cross_entropy(0.0, 1.0).is_finite());
        assert!(binary_cross_entropy(1.0, 0.0).is_finite());
        assert!(binary_cross_entropy(0.5, 1.0) > 0.0);
    }
}
