use thiserror::Error;

use crate::error::BellbookError;

/// Failures inside the credential layer.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Refresh rejected")]
    RefreshRejected,
    #[error("Invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<AuthError> for BellbookError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::NotLoggedIn | AuthError::RefreshRejected => BellbookError::Unauthorized,
            AuthError::Network(e) => BellbookError::Network(e),
            AuthError::InvalidResponse(e) => BellbookError::Serialization(e),
            other => BellbookError::Storage(other.to_string()),
        }
    }
}
