//! Train all classifiers, print held-out metrics and save the served model.
//!
//! Usage: train [DATA_PATH]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use heartrisk::adapters::{DelimitedFileSource, JsonModelStore};
use heartrisk::application::{prepare, SplitOptions, TrainingOptions, TrainingService};
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

    let store = Arc::new(JsonModelStore::new(&config.model_dir));
    let service = TrainingService::new(Arc::clone(&store), TrainingOptions::with_seed(config.seed));
    let report = service.run(&data).context("training failed")?;

    for model in &report.models {
        println!("{model}");
    }
    println!(
        "Saved {} model to {}",
        report.saved_model,
        store.artifact_path().display()
    );
    Ok(())
}
