//! Error types for BellBook.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use std::sync::Arc;

use thiserror::Error;

/// Message used when a failed response carries no readable `detail`.
pub const GENERIC_FAILURE: &str = "Request failed";

/// Primary error type for all BellBook operations.
#[derive(Error, Debug)]
pub enum BellbookError {
    /// Credentials were rejected and could not be refreshed.
    #[error("Unauthorized")]
    Unauthorized,

    /// The API answered with a non-success status. `message` is the body's
    /// `detail` field, or [`GENERIC_FAILURE`].
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Credential storage error: {0}")]
    Storage(String),

    /// The push connection broke mid-stream.
    #[error("Stream error: {0}")]
    Stream(String),

    /// A single failure delivered to every consumer of a shared fetch.
    #[error(transparent)]
    Shared(Arc<BellbookError>),
}

impl BellbookError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether this error means the session is gone (no refresh possible).
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Unauthorized => true,
            Self::Shared(inner) => inner.is_unauthorized(),
            _ => false,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized => ErrorCategory::Authentication,
            Self::Network(e) if e.is_timeout() => ErrorCategory::Timeout,
            Self::Network(_) => ErrorCategory::Network,
            Self::Io(_) | Self::Storage(_) => ErrorCategory::Storage,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Stream(_) => ErrorCategory::Network,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Validation,
            },
            Self::Shared(inner) => inner.category(),
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::SignInAgain,
            ErrorCategory::RateLimit
            | ErrorCategory::Network
            | ErrorCategory::Timeout
            | ErrorCategory::Server => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Validation => RecoverySuggestion::ShowToUser,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Storage => RecoverySuggestion::CheckStorage,
            ErrorCategory::Serialization => RecoverySuggestion::ContactSupport,
        }
    }
}

impl From<Arc<BellbookError>> for BellbookError {
    fn from(shared: Arc<BellbookError>) -> Self {
        Arc::try_unwrap(shared).unwrap_or_else(Self::Shared)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, BellbookError>;
