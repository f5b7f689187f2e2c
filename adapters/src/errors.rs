//! Custom error types specific to the `adapters` crate.
//!
//! These cover failures to complete an HTTP exchange at all. Status codes
//! returned by the backend are not errors at this layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request timed out")]
    TimeoutError,

    #[error("Invalid request: {0}")]
    RequestError(String),

    #[error("Failed to read response body: {0}")]
    BodyError(String),

    #[error("No scripted response left for {method} {url}")]
    UnscriptedError { method: String, url: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::TimeoutError
        } else if err.is_builder() {
            TransportError::RequestError(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::BodyError(err.to_string())
        } else {
            TransportError::ConnectionError(err.to_string())
        }
    }
}
