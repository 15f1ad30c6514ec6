//! Incremental extraction of telemetry records into the warehouse.
//!
//! One call to [`Extractor::run_cycle`] reads the control table, works out
//! which endpoints are due and for which window, fetches their records and
//! loads them, recording the outcome of every endpoint.
//!
//! [`invoke`] wires everything up from [`Settings`] and turns the result into
//! a short status and message for the caller.

#![doc(issue_tracker_base_url = "https://github.com/fleetload/fleetload/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod extractor;
mod invoke;
mod schedule;
mod secrets;

pub use config::{ConfigError, Settings};
pub use error::{ExtractError, Result};
pub use extractor::{CycleReport, EndpointOutcome, Extractor};
pub use invoke::{Invocation, build_extractor, execute, invoke};
pub use schedule::{Schedule, Scheduler};
pub use secrets::{EnvSecretStore, SecretStore};
