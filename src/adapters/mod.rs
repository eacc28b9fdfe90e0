//! Adapters layer: Concrete implementations of ports.
//!
//! - `loader`: delimited text files as a record source
//! - `store`: JSON model artifacts bound by a SHA-256 manifest

pub mod loader;
pub mod store;

pub use loader::{load_records, parse_records, DelimitedFileSource};
pub use store::{JsonModelStore, StoreError};
