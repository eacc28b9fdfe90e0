//! Environment configuration for the binaries.
//!
//! Every setting has a default; a set but unparsable variable is an error
//! rather than a silent fallback.

use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_DATA_PATH: &str = "data/processed.cleveland.data";
const DEFAULT_SEED: u64 = 42;
const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Error type for configuration parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}={value:?} is not valid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

fn parse_var<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

/// Settings of the prediction server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub model_dir: PathBuf,
}

impl ServeConfig {
    /// Read `HEARTRISK_HOST`, `HEARTRISK_PORT` and `HEARTRISK_MODEL_DIR`.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// # Errors
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: lookup("HEARTRISK_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_var(&lookup, "HEARTRISK_PORT", DEFAULT_PORT)?,
            model_dir: lookup("HEARTRISK_MODEL_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR), PathBuf::from),
        })
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Settings of the offline preprocessing and training steps.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub data_path: PathBuf,
    pub model_dir: PathBuf,
    pub seed: u64,
    pub test_fraction: f64,
}

impl PipelineConfig {
    /// Read `HEARTRISK_DATA_PATH`, `HEARTRISK_MODEL_DIR`, `HEARTRISK_SEED`
    /// and `HEARTRISK_TEST_FRACTION`.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// # Errors
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let test_fraction = parse_var(&lookup, "HEARTRISK_TEST_FRACTION", DEFAULT_TEST_FRACTION)?;
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(ConfigError::Invalid {
                key: "HEARTRISK_TEST_FRACTION",
                value: test_fraction.to_string(),
                reason: "must be strictly between 0 and 1".to_string(),
            });
        }
        Ok(Self {
            data_path: lookup("HEARTRISK_DATA_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_DATA_PATH), PathBuf::from),
            model_dir: lookup("HEARTRISK_MODEL_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR), PathBuf::from),
            seed: parse_var(&lookup, "HEARTRISK_SEED", DEFAULT_SEED)?,
            test_fraction,
        })
    }

    /// Replace the data path with a command-line override, if any.
    #[must_use]
    pub fn with_data_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.data_path = path;
        }
        self
    }
}
