//! Record source port: Trait for reading raw clinical records.

use crate::domain::{DataError, LoadedRecords};

/// A source of raw patient records.
///
/// Implementations drop rows with missing values and report how many they
/// discarded; malformed rows fail the whole load.
pub trait RecordSource {
    /// Read and clean all records.
    ///
    /// # Errors
    /// Returns `DataError` if the source cannot be read or contains a malformed row.
    fn load(&self) -> Result<LoadedRecords, DataError>;

    /// Human-readable description of the source (for logs).
    fn describe(&self) -> String;
}
