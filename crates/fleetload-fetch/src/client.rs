//! HTTP client for the telemetry API.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::retry::retry_fixed;
use crate::url::endpoint_url;

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is joined to.
    pub base_url: String,
    /// Number of attempts per request (at least one is always made).
    pub retries: u32,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration for the given base URL with default limits.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            retries: 3,
            timeout: Duration::from_secs(300),
            user_agent: format!("fleetload/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Why a single request attempt failed.
#[derive(Error, Debug)]
pub enum AttemptError {
    /// Server answered with a non-success status.
    #[error("HTTP status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// Request timed out.
    #[error("timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// Could not connect to the server.
    #[error("connection error: {0}")]
    Connect(#[source] reqwest::Error),

    /// Any other transport error.
    #[error("request error: {0}")]
    Request(#[source] reqwest::Error),

    /// The response could not be used.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AttemptError {
    /// Classifies a transport error.
    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else if error.is_connect() {
            Self::Connect(error)
        } else {
            Self::Request(error)
        }
    }

    /// Returns a short name for the failure class.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Timeout(_) => "timeout",
            Self::Connect(_) => "connect",
            Self::Request(_) => "request",
            Self::Unexpected(_) => "unexpected",
        }
    }
}

/// Errors returned by the API client.
#[derive(Error, Debug)]
pub enum RequestError {
    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// Every attempt failed; carries the last cause.
    #[error("Giving up on {url} after {attempts} attempt(s): {source}")]
    Exhausted {
        /// The requested URL.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// The failure of the final attempt.
        source: AttemptError,
    },

    /// The body parsed as JSON but is not a list of records.
    #[error("Invalid response from {url}: {message}")]
    InvalidBody {
        /// The requested URL.
        url: String,
        /// What was wrong with the body.
        message: String,
    },
}

/// GET client with a fixed number of immediate retries.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Creates a new API client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, RequestError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()
            .map_err(RequestError::Build)?;
        Ok(Self { client, config })
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issues a GET for `path` with the given query parameters and parses the
    /// JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Exhausted`] if every attempt fails.
    pub async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, RequestError> {
        let url = endpoint_url(&self.config.base_url, path);

        retry_fixed(&url, self.config.retries, |_| self.attempt(&url, params)).await
    }

    /// Makes a single request.
    async fn attempt(&self, url: &str, params: &[(&str, String)]) -> Result<Value, AttemptError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(params)
            .send()
            .await
            .map_err(AttemptError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(AttemptError::from_transport)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AttemptError::Unexpected(format!("invalid JSON body: {e}")))
    }
}
