//! HTTP client abstraction shared by all network workers.
//!
//! Every worker that touches the network goes through [`HttpClient`],
//! which keeps the workers testable with mock clients and keeps the
//! reqwest surface in one place.

use thiserror::Error;

/// Errors from HTTP operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("http request failed: {0}")]
    Request(String),

    /// Non-success status code.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

/// Blocking HTTP operations used by the background workers.
pub trait HttpClient: Send + Sync {
    /// Performs a GET request, returning the response body.
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Posts a JSON document, ignoring the response body.
    fn post_json(&self, url: &str, body: &str) -> Result<(), FetchError>;
}

/// Real HTTP client backed by reqwest's blocking API.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with the default 30 second timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(30)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Request(format!("failed to read response: {e}")))
    }

    fn post_json(&self, url: &str, body: &str) -> Result<(), FetchError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(())
    }
}
