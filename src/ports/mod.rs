//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and its collaborators (data sources, model
//! implementations, artifact storage).

mod classifier;
mod model_store;
mod record_source;

pub use classifier::{check_training_inputs, Classifier, ModelError, Trainer};
pub use model_store::ModelStore;
pub use record_source::RecordSource;
