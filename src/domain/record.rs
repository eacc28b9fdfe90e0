//! Clinical record types for heart disease risk prediction.
//!
//! Based on the UCI Cleveland heart disease dataset (`processed.cleveland.data`).

use serde::{Deserialize, Serialize};

/// Number of clinical attributes fed to the classifiers.
pub const NUM_FEATURES: usize = 13;

/// Number of columns in a raw record (13 attributes + severity label).
pub const COLUMN_COUNT: usize = NUM_FEATURES + 1;

/// Feature names in model input order.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

/// Column names of a raw record, in file order. `num` is the severity label.
pub const COLUMN_NAMES: [&str; COLUMN_COUNT] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal", "num",
];

/// Ordered feature vector, one value per entry of [`FEATURE_NAMES`].
pub type FeatureRow = [f64; NUM_FEATURES];

/// The 13 clinical attributes of one patient observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ClinicalFeatures {
    /// Age in years
    pub age: f64,

    /// Sex: 1 = male, 0 = female
    pub sex: f64,

    /// Chest pain type (1 = typical angina, 2 = atypical, 3 = non-anginal, 4 = asymptomatic)
    pub cp: f64,

    /// Resting blood pressure in mm Hg
    pub trestbps: f64,

    /// Serum cholesterol in mg/dl
    pub chol: f64,

    /// Fasting blood sugar > 120 mg/dl: 1 = true, 0 = false
    pub fbs: f64,

    /// Resting ECG result (0 = normal, 1 = ST-T abnormality, 2 = LV hypertrophy)
    pub restecg: f64,

    /// Maximum heart rate achieved
    pub thalach: f64,

    /// Exercise induced angina: 1 = yes, 0 = no
    pub exang: f64,

    /// ST depression induced by exercise relative to rest
    pub oldpeak: f64,

    /// Slope of the peak exercise ST segment
    pub slope: f64,

    /// Number of major vessels (0-3) colored by fluoroscopy
    pub ca: f64,

    /// Thalassemia code (3 = normal, 6 = fixed defect, 7 = reversible defect)
    pub thal: f64,
}

impl ClinicalFeatures {
    /// Convert to the ordered row used for training and inference.
    #[must_use]
    pub fn to_row(&self) -> FeatureRow {
        [
            self.age,
            self.sex,
            self.cp,
            self.trestbps,
            self.chol,
            self.fbs,
            self.restecg,
            self.thalach,
            self.exang,
            self.oldpeak,
            self.slope,
            self.ca,
            self.thal,
        ]
    }

    /// Create features from an ordered slice.
    ///
    /// # Errors
    /// Returns the offending length if the slice does not hold exactly 13 values.
    pub fn from_slice(v: &[f64]) -> Result<Self, usize> {
        if v.len() != NUM_FEATURES {
            return Err(v.len());
        }

        Ok(Self {
            age: v[0],
            sex: v[1],
            cp: v[2],
            trestbps: v[3],
            chol: v[4],
            fbs: v[5],
            restecg: v[6],
            thalach: v[7],
            exang: v[8],
            oldpeak: v[9],
            slope: v[10],
            ca: v[11],
            thal: v[12],
        })
    }

    /// Name of the first attribute that is not a finite number, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.to_row()
            .iter()
            .zip(FEATURE_NAMES)
            .find(|(v, _)| !v.is_finite())
            .map(|(_, name)| name)
    }
}

/// One cleaned patient observation with its raw severity label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Clinical attributes
    pub features: ClinicalFeatures,

    /// Raw diagnosis severity (`num`), 0 = no disease, 1-4 = increasing severity
    pub severity: f64,
}

impl Record {
    /// Build a record from the 14 numeric columns in file order.
    ///
    /// # Errors
    /// Returns the offending length if the slice does not hold exactly 14 values.
    pub fn from_columns(values: &[f64]) -> Result<Self, usize> {
        if values.len() != COLUMN_COUNT {
            return Err(values.len());
        }
        let features = ClinicalFeatures::from_slice(&values[..NUM_FEATURES])?;
        Ok(Self {
            features,
            severity: values[NUM_FEATURES],
        })
    }
}
