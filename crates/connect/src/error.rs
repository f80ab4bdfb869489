//! Error types for the portal API clients.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ConnectError>;

/// Retry policy class for API failures.
///
/// The engagement mirror is never retried inline; the class annotates the
/// operational log so out-of-band reconciliation can prioritize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRetryClass {
    Retryable,
    Permanent,
    ReauthRequired,
}

/// Errors that can occur while talking to the authority or the
/// engagement platform.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API error response from the remote service
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid request (missing required data, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication error (missing or invalid token)
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl ConnectError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify error for retry policy.
    pub fn retry_class(&self) -> ApiRetryClass {
        match self {
            Self::Api { status, .. } => match *status {
                401 | 403 => ApiRetryClass::ReauthRequired,
                408 | 409 | 423 | 425 | 429 => ApiRetryClass::Retryable,
                500..=599 => ApiRetryClass::Retryable,
                _ => ApiRetryClass::Permanent,
            },
            Self::Http(_) => ApiRetryClass::Retryable,
            Self::Json(_) => ApiRetryClass::Permanent,
            Self::InvalidRequest(_) => ApiRetryClass::Permanent,
            Self::Auth(_) => ApiRetryClass::ReauthRequired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_class_for_server_errors_is_retryable() {
        assert_eq!(
            ConnectError::api(503, "unavailable").retry_class(),
            ApiRetryClass::Retryable
        );
        assert_eq!(
            ConnectError::api(429, "slow down").retry_class(),
            ApiRetryClass::Retryable
        );
    }

    #[test]
    fn retry_class_for_auth_error_is_reauth() {
        assert_eq!(
            ConnectError::api(401, "unauthorized").retry_class(),
            ApiRetryClass::ReauthRequired
        );
        assert_eq!(
            ConnectError::auth("bad token").retry_class(),
            ApiRetryClass::ReauthRequired
        );
    }

    #[test]
    fn retry_class_for_client_errors_is_permanent() {
        assert_eq!(
            ConnectError::api(400, "bad payload").retry_class(),
            ApiRetryClass::Permanent
        );
        assert_eq!(
            ConnectError::invalid_request("missing field").retry_class(),
            ApiRetryClass::Permanent
        );
    }
}
