//! HTTP client and record fetching for the fleetload telemetry extractor.
//!
//! This crate provides the upstream side of an extraction:
//!
//! - [`ApiClient`] - GET client with a fixed number of immediate retries
//! - [`url::endpoint_url`] - Joins the base URL and an endpoint path
//! - [`TelemetryProvider`] - Provider wrapper mapping endpoints to requests
//! - [`RecordSource`] - Seam the orchestrator fetches records through

#![doc(issue_tracker_base_url = "https://github.com/fleetload/fleetload/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod provider;
mod retry;
pub mod url;

pub use client::{ApiClient, AttemptError, ClientConfig, RequestError};
pub use provider::{EndpointPaths, FetchResult, RecordSource, TelemetryProvider};
