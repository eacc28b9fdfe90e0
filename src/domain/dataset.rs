//! Labeled datasets, label binarization and the seeded train/test split.

use std::path::PathBuf;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use super::record::{FeatureRow, Record};

/// Errors raised while loading or preparing tabular data.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: expected {expected} fields, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("Invalid test fraction {0} (expected a value in (0, 1))")]
    InvalidTestFraction(f64),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

/// Row accounting for a single load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Non-blank rows read from the source
    pub rows_read: usize,
    /// Rows discarded because a field carried the missing-value sentinel
    pub rows_dropped: usize,
}

impl LoadReport {
    /// Rows kept after cleaning.
    #[must_use]
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.rows_dropped
    }
}

/// Cleaned records plus the accounting of how they were obtained.
#[derive(Debug, Clone)]
pub struct LoadedRecords {
    pub records: Vec<Record>,
    pub report: LoadReport,
}

/// Feature rows with their binary disease targets, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledDataset {
    pub features: Vec<FeatureRow>,
    pub targets: Vec<u8>,
}

impl LabeledDataset {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Number of rows with target 1.
    #[must_use]
    pub fn positive_count(&self) -> usize {
        self.targets.iter().filter(|&&t| t == 1).count()
    }
}

/// Map a raw severity label to the binary disease target.
#[must_use]
pub fn binarize_severity(severity: f64) -> u8 {
    u8::from(severity > 0.0)
}

/// Replace the multi-class severity with the binary target, keeping row order.
#[must_use]
pub fn binarize(records: &[Record]) -> LabeledDataset {
    let (features, targets) = records
        .iter()
        .map(|r| (r.features.to_row(), binarize_severity(r.severity)))
        .unzip();
    LabeledDataset { features, targets }
}

/// Train and test partitions of a labeled dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub x_train: Vec<FeatureRow>,
    pub x_test: Vec<FeatureRow>,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
}

/// Partition a dataset into train and test sets.
///
/// The test partition holds `ceil(n * test_fraction)` rows. Rows are assigned
/// from a permutation drawn from a `ChaCha20Rng` seeded with `seed`, so the
/// same input and seed always give the same partition.
///
/// # Errors
/// Returns `DataError::InsufficientData` if the dataset is empty or either
/// partition would end up empty.
pub fn train_test_split(
    dataset: &LabeledDataset,
    test_fraction: f64,
    seed: u64,
) -> Result<Split, DataError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DataError::InvalidTestFraction(test_fraction));
    }
    let n = dataset.len();
    if n == 0 {
        return Err(DataError::InsufficientData(
            "cannot split an empty dataset".to_string(),
        ));
    }

    let n_test = (n as f64 * test_fraction).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_train == 0 {
        return Err(DataError::InsufficientData(format!(
            "{n} rows leave no training rows at test fraction {test_fraction}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let (test_idx, train_idx) = indices.split_at(n_test);

    let take = |idx: &[usize]| -> (Vec<FeatureRow>, Vec<u8>) {
        idx.iter()
            .map(|&i| (dataset.features[i], dataset.targets[i]))
            .unzip()
    };
    let (x_train, y_train) = take(train_idx);
    let (x_test, y_test) = take(test_idx);

    Ok(Split {
        x_train,
        x_test,
        y_train,
        y_test,
    })
}
