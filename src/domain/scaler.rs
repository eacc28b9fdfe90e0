//! Per-attribute standardization fitted on the training partition.

use serde::{Deserialize, Serialize};

use super::dataset::DataError;
use super::record::{FeatureRow, NUM_FEATURES};

/// Mean and population standard deviation of each attribute.
///
/// Fitted once on the training rows and reapplied unchanged to test rows and
/// to every inference request. A constant attribute gets a standard
/// deviation of 1.0 so it maps to zero instead of NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: FeatureRow,
    pub std: FeatureRow,
}

impl StandardScaler {
    /// Fit the scaler on the given rows.
    ///
    /// # Errors
    /// Returns `DataError::InsufficientData` for an empty input.
    pub fn fit(rows: &[FeatureRow]) -> Result<Self, DataError> {
        if rows.is_empty() {
            return Err(DataError::InsufficientData(
                "cannot fit a scaler on zero rows".to_string(),
            ));
        }
        let n = rows.len() as f64;

        let mut mean = [0.0; NUM_FEATURES];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut std = [0.0; NUM_FEATURES];
        for row in rows {
            for i in 0..NUM_FEATURES {
                let diff = row[i] - mean[i];
                std[i] += diff * diff;
            }
        }
        for s in &mut std {
            *s = (*s / n).sqrt();
            if *s == 0.0 || !s.is_finite() {
                *s = 1.0;
            }
        }

        Ok(Self { mean, std })
    }

    /// Standardize a single row.
    #[must_use]
    pub fn transform_row(&self, row: &FeatureRow) -> FeatureRow {
        let mut out = [0.0; NUM_FEATURES];
        for i in 0..NUM_FEATURES {
            out[i] = (row[i] - self.mean[i]) / self.std[i];
        }
        out
    }

    /// Standardize a batch of rows.
    #[must_use]
    pub fn transform(&self, rows: &[FeatureRow]) -> Vec<FeatureRow> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    /// Check that the parameters can be applied (finite means, positive deviations).
    ///
    /// # Errors
    /// Returns a description of the first invalid parameter.
    pub fn validate(&self) -> Result<(), String> {
        for i in 0..NUM_FEATURES {
            if !self.mean[i].is_finite() {
                return Err(format!("scaler mean for feature {i} is not finite"));
            }
            if !(self.std[i].is_finite() && self.std[i] > 0.0) {
                return Err(format!("scaler std for feature {i} must be > 0"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<FeatureRow> {
        (0..20)
            .map(|i| {
                let mut row = [0.0; NUM_FEATURES];
                for (j, v) in row.iter_mut().enumerate() {
                    *v = (i * (j + 1)) as f64 + (j as f64) * 10.0;
                }
                // Constant column.
                row[5] = 1.0;
                row
            })
            .collect()
    }

    #[test]
    fn test_fit_transform_gives_zero_mean_unit_variance() {
        let rows = rows();
        let scaler = StandardScaler::fit(&rows).expect("Should fit");
        let scaled = scaler.transform(&rows);
        let n = scaled.len() as f64;

        for j in 0..NUM_FEATURES {
            let mean: f64 = scaled.iter().map(|r| r[j]).sum::<f64>() / n;
            let var: f64 = scaled.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n;
            assert!(mean.abs() < 1e-9, "feature {j} mean {mean}");
            if j == 5 {
                assert!(var.abs() < 1e-12, "constant feature should scale to zero");
            } else {
                assert!((var - 1.0).abs() < 1e-9, "feature {j} variance {var}");
            }
        }
    }

    #[test]
    fn test_constant_column_gets_unit_std() {
        let scaler = StandardScaler::fit(&rows()).expect("Should fit");
        assert!((scaler.std[5] - 1.0).abs() < f64::EPSILON);
        assert!(scaler.validate().is_ok());
    }

    #[test]
    fn test_transform_uses_fitted_parameters_only() {
        let train = rows();
        let scaler = StandardScaler::fit(&train).expect("Should fit");

        let mut row = [0.0; NUM_FEATURES];
        row[0] = scaler.mean[0] + 2.0 * scaler.std[0];
        let out = scaler.transform_row(&row);
        assert!((out[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_rejects_empty_input() {
        let err = StandardScaler::fit(&[]).expect_err("must fail");
        assert!(matches!(err, DataError::InsufficientData(_)));
    }

    #[test]
    fn test_validate_rejects_zero_std() {
        let mut scaler = StandardScaler::fit(&rows()).expect("Should fit");
        scaler.std[3] = 0.0;
        assert!(scaler.validate().is_err());
    }
}
