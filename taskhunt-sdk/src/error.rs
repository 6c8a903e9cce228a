//! SDK error types and handling
//!
//! Every failure an API call can produce is one of two kinds: the
//! transport never delivered a response (`NetworkError`), or a response
//! arrived with a status outside 2xx (`ApiError`). The remaining variants
//! cover local problems such as bad configuration or an undecodable body.

use thiserror::Error;

/// The main error type for the SDK
#[derive(Error, Debug)]
pub enum SdkError {
    /// API returned a non-2xx response
    #[error("API error: {status} {status_text}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase for the status
        status_text: String,
        /// Response body, as returned by the server
        message: String,
    },

    /// Network or connection error, no response was received
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Response body did not decode into the declared shape
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Result type alias for SDK operations
pub type SdkResult<T> = Result<T, SdkError>;

impl SdkError {
    /// Create an API error from a response status and body
    pub fn from_response(status: u16, body: &str) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string();

        SdkError::ApiError {
            status,
            status_text,
            message: body.to_string(),
        }
    }

    /// Get the HTTP status code if a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SdkError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the server reported the resource as absent
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// True when the failure happened before any response arrived
    pub fn is_network(&self) -> bool {
        matches!(self, SdkError::NetworkError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_response() {
        let error = SdkError::from_response(404, r#"{"detail":"Task not found"}"#);

        assert!(error.is_not_found());
        assert_eq!(error.status_code(), Some(404));
        assert_eq!(error.to_string(), "API error: 404 Not Found");
        match error {
            SdkError::ApiError { message, .. } => {
                assert_eq!(message, r#"{"detail":"Task not found"}"#)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_server_error_message() {
        let error = SdkError::from_response(500, "boom");
        assert_eq!(error.to_string(), "API error: 500 Internal Server Error");
        assert!(!error.is_not_found());
        assert!(!error.is_network());
    }

    #[test]
    fn test_unknown_status_has_empty_reason() {
        let error = SdkError::from_response(599, "");
        assert_eq!(error.status_code(), Some(599));
        assert_eq!(error.to_string(), "API error: 599 ");
    }

    #[test]
    fn test_local_errors_have_no_status() {
        let error = SdkError::ConfigurationError("Base URL cannot be empty".to_string());
        assert_eq!(error.status_code(), None);

        let error: SdkError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(error.status_code(), None);
    }
}
