//! Telemetry provider requests.

use async_trait::async_trait;
use fleetload_types::{Endpoint, ExtractionWindow, Provider, format_timestamp};
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

use crate::url::endpoint_url;
use crate::{ApiClient, RequestError};

/// Records returned for one endpoint and window.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    /// The endpoint the records came from.
    pub endpoint: Endpoint,
    /// The window that was requested.
    pub window: ExtractionWindow,
    /// Raw records, in upstream order.
    pub records: Vec<Value>,
}

impl FetchResult {
    /// Number of records returned.
    #[must_use]
    pub fn count(&self) -> usize {
        self.records.len()
    }
}

/// Anything that can fetch an endpoint's records for a window.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetches the records of `endpoint` inside `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be retrieved.
    async fn fetch(
        &self,
        endpoint: Endpoint,
        window: &ExtractionWindow,
    ) -> Result<FetchResult, RequestError>;
}

/// Path suffix of each endpoint under the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPaths {
    paths: HashMap<Endpoint, String>,
}

impl EndpointPaths {
    /// Sets the path for an endpoint.
    #[must_use]
    pub fn with(mut self, endpoint: Endpoint, path: impl Into<String>) -> Self {
        self.paths.insert(endpoint, path.into());
        self
    }

    /// Returns the path for an endpoint.
    #[must_use]
    pub fn get(&self, endpoint: Endpoint) -> &str {
        self.paths
            .get(&endpoint)
            .map_or_else(|| endpoint.as_str(), String::as_str)
    }
}

impl Default for EndpointPaths {
    /// Every endpoint is served under its own name.
    fn default() -> Self {
        let paths = Endpoint::all()
            .iter()
            .map(|endpoint| (*endpoint, endpoint.as_str().to_string()))
            .collect();
        Self { paths }
    }
}

/// Provider-specific wrapper around an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct TelemetryProvider {
    provider: Provider,
    client: ApiClient,
    api_key: String,
    paths: EndpointPaths,
}

impl TelemetryProvider {
    /// Creates a provider wrapper.
    #[must_use]
    pub fn new(
        provider: Provider,
        client: ApiClient,
        api_key: impl Into<String>,
        paths: EndpointPaths,
    ) -> Self {
        Self {
            provider,
            client,
            api_key: api_key.into(),
            paths,
        }
    }

    /// Builds the query parameters for an endpoint and window.
    fn params(&self, endpoint: Endpoint, window: &ExtractionWindow) -> Vec<(&'static str, String)> {
        let (start_key, end_key) = match endpoint {
            Endpoint::Iplan | Endpoint::ViagensRetroativas => ("dataInicial", "dataFinal"),
            Endpoint::ViagensConsolidadas => (
                "datetime_processamento_inicio",
                "datetime_processamento_fim",
            ),
        };

        vec![
            ("guidIdentificacao", self.api_key.clone()),
            (start_key, format_timestamp(window.start())),
            (end_key, format_timestamp(window.end())),
        ]
    }
}

#[async_trait]
impl RecordSource for TelemetryProvider {
    async fn fetch(
        &self,
        endpoint: Endpoint,
        window: &ExtractionWindow,
    ) -> Result<FetchResult, RequestError> {
        let path = self.paths.get(endpoint);
        let params = self.params(endpoint, window);

        let body = self.client.get(path, &params).await?;
        let records = records_from_body(body).map_err(|message| RequestError::InvalidBody {
            url: endpoint_url(&self.client.config().base_url, path),
            message,
        })?;

        info!(
            provider = %self.provider,
            endpoint = %endpoint,
            records = records.len(),
            "records returned by the API"
        );

        Ok(FetchResult {
            endpoint,
            window: *window,
            records,
        })
    }
}

/// Extracts the record list from a response body.
fn records_from_body(body: Value) -> Result<Vec<Value>, String> {
    match body {
        Value::Array(records) => Ok(records),
        Value::Null => Ok(Vec::new()),
        other => Err(format!(
            "expected a JSON array of records, got {}",
            json_kind(&other)
        )),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
