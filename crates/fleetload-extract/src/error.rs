//! Extraction errors.

use fleetload_fetch::RequestError;
use fleetload_format::ConvertError;
use fleetload_types::TypeError;
use fleetload_warehouse::WarehouseError;
use thiserror::Error;

use crate::ConfigError;

/// Errors that can end an endpoint's extraction or a whole cycle.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The upstream API could not be reached or gave an unusable answer.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Records could not be converted to a table.
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// A stored name is not recognised.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// The warehouse rejected a read or write.
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    /// Settings are missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Anything else.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
