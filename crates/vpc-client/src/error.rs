//! Cloud network API errors

use thiserror::Error;

/// Errors that can occur when calling the cloud network API
#[derive(Debug, Error)]
pub enum VpcError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (invalid token, expired, etc.)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected by rate limiting
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Invalid request (e.g., disassociating a block that is not associated)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl VpcError {
    /// Whether a retry with unchanged input can succeed.
    ///
    /// Transport failures, rate limits and server-side errors are retryable;
    /// missing resources, auth failures and malformed requests are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            VpcError::Http(_) | VpcError::RateLimited(_) => true,
            VpcError::Api { status, .. } => *status >= 500,
            VpcError::Serialization(_)
            | VpcError::Authentication(_)
            | VpcError::NotFound(_)
            | VpcError::InvalidRequest(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(VpcError::RateLimited("429".to_string()).is_retryable());
        assert!(
            VpcError::Api {
                status: 503,
                message: "unavailable".to_string()
            }
            .is_retryable()
        );
        assert!(
            !VpcError::Api {
                status: 400,
                message: "bad cidr".to_string()
            }
            .is_retryable()
        );
        assert!(!VpcError::NotFound("vpc-123".to_string()).is_retryable());
        assert!(!VpcError::Authentication("expired".to_string()).is_retryable());
    }
}
