//! Conversion errors.

use thiserror::Error;

/// Errors that can occur while converting records to tabular form.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// A record was not a JSON object.
    #[error("Record {index} is not a JSON object")]
    NotAnObject {
        /// Position of the record in the input.
        index: usize,
    },

    /// Arrow schema inference or decoding failed.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet serialization failed.
    #[error("Parquet error: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),
}
