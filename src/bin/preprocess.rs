//! Run the preparation step and report the partition shapes.
//!
//! Usage: preprocess [DATA_PATH]

use std::path::PathBuf;

use anyhow::{Context, Result};

use heartrisk::adapters::DelimitedFileSource;
use heartrisk::application::{prepare, SplitOptions};
use heartrisk::config::PipelineConfig;

fn main() -> Result<()> {
    let _guard = heartrisk::logging::init().context("failed to initialize logging")?;

    let config = PipelineConfig::from_env()?.with_data_path(std::env::args().nth(1).map(PathBuf::from));
    let source = DelimitedFileSource::new(&config.data_path);
    let data = prepare(
        &source,
        SplitOptions {
            test_fraction: config.test_fraction,
            seed: config.seed,
        },
    )
    .with_context(|| format!("failed to prepare {}", config.data_path.display()))?;

    let (train_rows, train_cols) = data.train_shape();
    let (test_rows, test_cols) = data.test_shape();
    println!(
        "Data loaded. Train shape: ({train_rows}, {train_cols}), Test shape: ({test_rows}, {test_cols})"
    );
    println!(
        "Rows read: {}, dropped for missing values: {}",
        data.report.rows_read, data.report.rows_dropped
    );
    Ok(())
}
