//! Global portal error types.
//!
//! Every operation in the crate returns `Result<T>`. `Unauthorized` is the only
//! variant with a global side effect: by the time a caller sees it the session
//! has already been wiped and the navigator sent to the login route. All other
//! variants are handed back for page-level display.

use adapters::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    /// Sign-in rejected: bad credentials or an envelope without a token.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The backend answered 401 to an authenticated call.
    #[error("Session expired or unauthorized: {0}")]
    Unauthorized(String),

    /// The current user lacks a permission required by a feature.
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Missing or inconsistent form input, caught before any request is sent.
    #[error("{0}")]
    Validation(String),

    /// Any other non-success HTTP status.
    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The backend answered with a body that does not match the expected shape.
    #[error("Malformed response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    /// A request body or query could not be serialized.
    #[error("Cannot encode {0}")]
    Encode(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PortalError {
    /// Message suitable for a toast or CLI error line.
    pub fn user_message(&self) -> String {
        match self {
            PortalError::Authentication(message)
            | PortalError::Validation(message)
            | PortalError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            PortalError::Unauthorized(_) => Some(401),
            PortalError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        PortalError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_backend_text() {
        let err = PortalError::Api {
            status: 500,
            message: "Failed to upload document".to_string(),
        };
        assert_eq!(err.user_message(), "Failed to upload document");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn unauthorized_reports_401() {
        let err = PortalError::Unauthorized("token expired".to_string());
        assert_eq!(err.status(), Some(401));
        assert!(err.user_message().contains("token expired"));
    }
}
