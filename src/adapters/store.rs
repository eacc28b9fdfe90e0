//! JSON model store: Implementation of ModelStore.
//!
//! The artifact is written as `best_model.json` next to a `manifest.json`
//! that binds it by SHA-256. Loading refuses any artifact whose bytes do not
//! match the manifest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ml::ModelArtifact;
use crate::ports::ModelStore;

/// File name of the persisted artifact.
pub const ARTIFACT_FILE: &str = "best_model.json";

/// File name of the integrity manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

const MANIFEST_VERSION: u32 = 1;

/// Error type for model store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No model artifact at {0:?}")]
    Missing(PathBuf),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("Artifact hash mismatch: expected {expected}, found {actual}")]
    Integrity { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid artifact: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    created_at: DateTime<Utc>,
    files: BTreeMap<String, String>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Write through a sibling temp file so readers never see a partial file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Model store rooted at a directory.
#[derive(Debug, Clone)]
pub struct JsonModelStore {
    dir: PathBuf,
}

impl JsonModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_FILE)
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    fn read_manifest(&self) -> Result<Manifest, StoreError> {
        let path = self.manifest_path();
        let bytes = fs::read(&path)
            .map_err(|e| StoreError::Manifest(format!("cannot read {}: {e}", path.display())))?;
        let manifest: Manifest = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Manifest(format!("invalid JSON: {e}")))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(StoreError::Manifest(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }
        Ok(manifest)
    }
}

impl ModelStore for JsonModelStore {
    type Error = StoreError;

    fn save(&self, artifact: &ModelArtifact) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        let bytes = serde_json::to_vec_pretty(artifact)?;
        let digest = sha256_hex(&bytes);
        write_atomic(&self.artifact_path(), &bytes)?;

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            created_at: Utc::now(),
            files: BTreeMap::from([(ARTIFACT_FILE.to_string(), digest.clone())]),
        };
        write_atomic(&self.manifest_path(), &serde_json::to_vec_pretty(&manifest)?)?;

        tracing::info!(
            path = %self.artifact_path().display(),
            sha256 = %digest,
            model = artifact.model.kind(),
            "Model artifact saved"
        );
        Ok(())
    }

    fn load(&self) -> Result<ModelArtifact, StoreError> {
        let path = self.artifact_path();
        if !path.exists() {
            return Err(StoreError::Missing(path));
        }

        let manifest = self.read_manifest()?;
        let expected = manifest.files.get(ARTIFACT_FILE).ok_or_else(|| {
            StoreError::Manifest(format!("{MANIFEST_FILE} does not bind {ARTIFACT_FILE}"))
        })?;

        let bytes = fs::read(&path)?;
        let actual = sha256_hex(&bytes);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(StoreError::Integrity {
                expected: expected.clone(),
                actual,
            });
        }

        let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;
        artifact
            .validate()
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        tracing::info!(
            path = %path.display(),
            model = artifact.model.kind(),
            created_at = %artifact.created_at,
            "Model artifact loaded"
        );
        Ok(artifact)
    }

    fn exists(&self) -> bool {
        self.artifact_path().exists() && self.manifest_path().exists()
    }
}
