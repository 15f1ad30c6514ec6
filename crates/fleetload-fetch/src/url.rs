//! Upstream URL construction.

/// Builds the URL for an endpoint path under the API base URL.
///
/// Exactly one `/` separates the two parts regardless of how either is
/// written.
///
/// # Example
///
/// ```
/// use fleetload_fetch::url::endpoint_url;
///
/// let url = endpoint_url("https://api.example.com/v1/", "/EnvioIplan");
/// assert_eq!(url, "https://api.example.com/v1/EnvioIplan");
/// ```
#[must_use]
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
