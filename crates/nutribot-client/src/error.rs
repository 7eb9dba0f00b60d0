//! Error types for the analysis and nutrition service client.

use nutribot_core::error::NutriError;

/// Errors from either remote service.
///
/// Callers treat every variant the same way: the operation failed and the
/// conversation goes back to idle.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },
    #[error("could not decode {endpoint} response: {message}")]
    Decode { endpoint: String, message: String },
    #[error("could not build image upload: {0}")]
    Multipart(String),
}

impl From<NutriError> for ServiceError {
    fn from(err: NutriError) -> Self {
        ServiceError::Config(err.to_string())
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
