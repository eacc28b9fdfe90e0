//! # Heartrisk
//!
//! Heart disease risk classifier pipeline for the Cleveland clinical dataset.
//!
//! This crate provides:
//! - Loading and cleaning of delimited clinical records
//! - Label binarization, a seeded train/test split and standard scaling
//! - Three classifiers (random forest, gradient-boosted trees, neural network)
//! - A model artifact store and an HTTP prediction service
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (records, datasets, scaler, predictions)
//! - `ports`: Trait definitions for record sources, classifiers and model storage
//! - `adapters`: Concrete implementations (delimited file loader, JSON model store)
//! - `ml`: The classifiers, their trainers and evaluation metrics
//! - `application`: Use cases orchestrating domain and ports
//! - `http`: The prediction API

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod logging;
pub mod ml;
pub mod ports;

pub use domain::{ClinicalFeatures, Prediction, Record, StandardScaler};

/// Result type for Heartrisk operations
pub type Result<T> = std::result::Result<T, HeartriskError>;

/// Main error type for Heartrisk
#[derive(Debug, thiserror::Error)]
pub enum HeartriskError {
    #[error("Data error: {0}")]
    Data(#[from] domain::DataError),

    #[error("Model error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Model store error: {0}")]
    Store(#[from] adapters::StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
