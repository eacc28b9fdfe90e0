//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod prediction;
mod preprocessing;
mod training;

pub use prediction::PredictionService;
pub use preprocessing::{prepare, PreparedData, SplitOptions};
pub use training::{ModelReport, TrainingOptions, TrainingReport, TrainingService};
