//! Core types for the fleetload telemetry extractor.
//!
//! This crate provides the domain vocabulary shared by every other crate:
//!
//! - [`Provider`] - The upstream telemetry provider
//! - [`Endpoint`] - One of the provider's data feeds
//! - [`EndpointSpec`] - Cadence and target table for an endpoint
//! - [`Cadence`] - Fixed window length, or unbounded
//! - [`ExtractionWindow`] - Half-open `[start, end)` time window
//! - [`ControlRecord`] - One row of the extraction control table

#![doc(issue_tracker_base_url = "https://github.com/fleetload/fleetload/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cadence;
mod control;
mod endpoint;
mod error;
mod provider;
mod window;

pub use cadence::Cadence;
pub use control::{ControlRecord, ExtractionStatus};
pub use endpoint::{Endpoint, EndpointSpec};
pub use error::{Result, TypeError, WindowError};
pub use provider::Provider;
pub use window::{ExtractionWindow, TIMESTAMP_FORMAT, format_timestamp, parse_timestamp};
