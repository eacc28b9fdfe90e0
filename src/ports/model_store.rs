//! Model store port: Trait for persisting the trained model artifact.

use crate::ml::ModelArtifact;

/// Trait for model artifact persistence.
///
/// The artifact is written once after training and read once at service
/// startup.
pub trait ModelStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist an artifact, replacing any previous one.
    ///
    /// # Errors
    /// Returns error if the artifact cannot be written.
    fn save(&self, artifact: &ModelArtifact) -> Result<(), Self::Error>;

    /// Load the persisted artifact.
    ///
    /// # Errors
    /// Returns error if the artifact is missing, unreadable or corrupt.
    fn load(&self) -> Result<ModelArtifact, Self::Error>;

    /// Check whether an artifact has been persisted.
    fn exists(&self) -> bool;
}
