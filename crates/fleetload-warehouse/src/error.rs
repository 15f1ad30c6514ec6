//! Warehouse errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::TableRef;

/// Errors that can occur while talking to the warehouse.
#[derive(Error, Debug)]
pub enum WarehouseError {
    /// The table does not exist.
    #[error("Table not found: {0}")]
    TableNotFound(TableRef),

    /// Failed to create a directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read a directory.
    #[error("Failed to read directory '{path}': {source}")]
    ReadDir {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse a control table document.
    #[error("Failed to parse control table '{path}': {source}")]
    ParseJson {
        /// The path that could not be parsed.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Failed to serialize a control table document.
    #[error("Failed to serialize control table: {0}")]
    SerializeJson(#[from] serde_json::Error),

    /// Failed to encode or inspect a data file.
    #[error("Failed to process data file: {0}")]
    Format(#[from] fleetload_format::ConvertError),

    /// Another writer panicked while holding the control table lock.
    #[error("Control table lock poisoned")]
    Poisoned,
}

/// Result type for warehouse operations.
pub type Result<T> = std::result::Result<T, WarehouseError>;
