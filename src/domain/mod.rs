//! Domain layer: Core types and pure data transformations.
//!
//! Nothing in here touches the filesystem or the network. Loading, training
//! and serving live in the outer layers and hand plain values to these types.

mod dataset;
mod diagnosis;
mod record;
mod scaler;

pub use dataset::{
    binarize, binarize_severity, train_test_split, DataError, LabeledDataset, LoadReport,
    LoadedRecords, Split,
};
pub use diagnosis::{Prediction, PredictError, PredictionOutcome, DECISION_THRESHOLD};
pub use record::{
    ClinicalFeatures, FeatureRow, Record, COLUMN_COUNT, COLUMN_NAMES, FEATURE_NAMES,
    NUM_FEATURES,
};
pub use scaler::StandardScaler;
