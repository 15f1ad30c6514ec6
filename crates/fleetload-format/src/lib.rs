//! Tabular conversion for the fleetload telemetry extractor.
//!
//! Upstream records are opaque JSON objects. This crate turns a list of them
//! into an Arrow [`RecordBatch`](arrow::record_batch::RecordBatch) and writes
//! batches as Parquet:
//!
//! - [`flatten_record`] - Flattens nested objects into dotted column names
//! - [`records_to_batch`] - Infers a schema and builds a record batch
//! - [`stamp_extraction_time`] - Adds the extraction timestamp column
//! - [`ParquetFormatter`] - Apache Parquet serialization

#![doc(issue_tracker_base_url = "https://github.com/fleetload/fleetload/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod flatten;
mod parquet;
mod table;

pub use crate::parquet::ParquetFormatter;
pub use error::ConvertError;
pub use flatten::flatten_record;
pub use table::{EXTRACTION_TS_COLUMN, records_to_batch, stamp_extraction_time};
