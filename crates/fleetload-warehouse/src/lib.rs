//! Warehouse access for fleetload.
//!
//! - [`Warehouse`] - What the extractor needs from a data warehouse
//! - [`LocalWarehouse`] - A warehouse kept on the local filesystem
//! - [`ControlTable`] - Per-endpoint extraction progress

#![doc(issue_tracker_base_url = "https://github.com/fleetload/fleetload/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod control;
mod error;
mod local;
mod warehouse;

pub use control::{ControlTable, DEFAULT_BACKOFF_MINUTES};
pub use error::{Result, WarehouseError};
pub use local::LocalWarehouse;
pub use warehouse::{TableRef, Warehouse};
