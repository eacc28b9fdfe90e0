//! Classifiers, their trainers and held-out evaluation.

pub mod artifact;
pub mod forest;
pub mod gbdt;
pub mod metrics;
pub mod mlp;
mod tree;

pub use artifact::{ModelArtifact, TrainedModel, ARTIFACT_FORMAT_VERSION};
pub use forest::{ForestModel, ForestOptions, RandomForestTrainer};
pub use gbdt::{BoostingOptions, GbdtModel, GradientBoostingTrainer};
pub use metrics::EvaluationMetrics;
pub use mlp::{MlpModel, MlpOptions, NeuralNetworkTrainer};
pub use tree::{Node, Tree};
