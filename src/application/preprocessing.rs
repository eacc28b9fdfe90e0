//! Preprocessing use case: load, binarize, split and scale.

use crate::domain::{
    binarize, train_test_split, DataError, FeatureRow, LoadReport, StandardScaler, NUM_FEATURES,
};
use crate::ports::RecordSource;

/// Parameters of the train/test split.
#[derive(Debug, Clone, Copy)]
pub struct SplitOptions {
    /// Fraction of rows assigned to the test partition.
    pub test_fraction: f64,
    /// Seed of the row permutation.
    pub seed: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Scaled train/test partitions and the scaler fitted on the train rows.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub x_train: Vec<FeatureRow>,
    pub x_test: Vec<FeatureRow>,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
    pub scaler: StandardScaler,
    pub report: LoadReport,
}

impl PreparedData {
    /// `(rows, columns)` of the train matrix.
    #[must_use]
    pub fn train_shape(&self) -> (usize, usize) {
        (self.x_train.len(), NUM_FEATURES)
    }

    /// `(rows, columns)` of the test matrix.
    #[must_use]
    pub fn test_shape(&self) -> (usize, usize) {
        (self.x_test.len(), NUM_FEATURES)
    }
}

/// Compose the whole preparation step over a record source.
///
/// # Errors
/// Returns `DataError` if loading fails, too few rows remain, or the split
/// options are invalid.
pub fn prepare<S: RecordSource + ?Sized>(
    source: &S,
    options: SplitOptions,
) -> Result<PreparedData, DataError> {
    tracing::info!(source = %source.describe(), "Preparing data");
    let loaded = source.load()?;
    if loaded.records.is_empty() {
        return Err(DataError::InsufficientData(format!(
            "no usable records in {}",
            source.describe()
        )));
    }

    let dataset = binarize(&loaded.records);
    let split = train_test_split(&dataset, options.test_fraction, options.seed)?;

    let scaler = StandardScaler::fit(&split.x_train)?;
    let x_train = scaler.transform(&split.x_train);
    let x_test = scaler.transform(&split.x_test);

    tracing::info!(
        train_rows = x_train.len(),
        test_rows = x_test.len(),
        positives = dataset.positive_count(),
        "Data prepared"
    );

    Ok(PreparedData {
        x_train,
        x_test,
        y_train: split.y_train,
        y_test: split.y_test,
        scaler,
        report: loaded.report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClinicalFeatures, LoadedRecords, Record};

    struct MemorySource(Vec<Record>);

    impl RecordSource for MemorySource {
        fn load(&self) -> Result<LoadedRecords, DataError> {
            Ok(LoadedRecords {
                records: self.0.clone(),
                report: LoadReport {
                    rows_read: self.0.len() + 1,
                    rows_dropped: 1,
                },
            })
        }

        fn describe(&self) -> String {
            "memory".to_string()
        }
    }

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record {
                features: ClinicalFeatures {
                    age: 30.0 + i as f64,
                    chol: 200.0 + (i % 7) as f64 * 10.0,
                    sex: (i % 2) as f64,
                    ..Default::default()
                },
                severity: (i % 3) as f64,
            })
            .collect()
    }

    #[test]
    fn test_prepare_shapes_and_report() {
        let data = prepare(&MemorySource(records(50)), SplitOptions::default())
            .expect("Should prepare");
        assert_eq!(data.test_shape(), (10, 13));
        assert_eq!(data.train_shape(), (40, 13));
        assert_eq!(data.y_train.len(), 40);
        assert_eq!(data.y_test.len(), 10);
        assert_eq!(data.report.rows_dropped, 1);
    }

    #[test]
    fn test_train_partition_is_standardized() {
        let data = prepare(&MemorySource(records(50)), SplitOptions::default())
            .expect("Should prepare");
        let n = data.x_train.len() as f64;
        for col in 0..NUM_FEATURES {
            let mean: f64 = data.x_train.iter().map(|r| r[col]).sum::<f64>() / n;
            assert!(mean.abs() < 1e-9, "column {col} mean {mean}");
        }
        // Constant column stays at zero.
        assert!(data.x_train.iter().all(|r| r[2] == 0.0));
        assert_eq!(data.scaler.std[2], 1.0);
    }

    #[test]
    fn test_prepare_is_deterministic() {
        let source = MemorySource(records(30));
        let a = prepare(&source, SplitOptions::default()).expect("Should prepare");
        let b = prepare(&source, SplitOptions::default()).expect("Should prepare");
        assert_eq!(a.x_test, b.x_test);
        assert_eq!(a.y_train, b.y_train);
    }

    #[test]
    fn test_empty_source_is_insufficient() {
        let err = prepare(&MemorySource(Vec::new()), SplitOptions::default())
            .expect_err("must fail");
        assert!(matches!(err, DataError::InsufficientData(_)));
    }
}
