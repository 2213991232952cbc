//! Unified error classification and recovery.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    /// 4xx business or validation failure, shown verbatim by the caller.
    Validation,
    Configuration,
    Storage,
    Serialization,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    SignInAgain,
    ShowToUser,
    CheckConfiguration,
    CheckStorage,
    ContactSupport,
}

impl RecoverySuggestion {
    /// Short advice for a terminal user; `None` when the message says it all.
    pub fn hint(self) -> Option<&'static str> {
        match self {
            Self::RetryWithBackoff => Some("The server could not be reached. Try again shortly."),
            Self::SignInAgain => Some("Sign in again with `bellbook auth login`."),
            Self::ShowToUser => None,
            Self::CheckConfiguration => Some("Check BELLBOOK_BASE_URL and related settings."),
            Self::CheckStorage => Some("Check that the BellBook home directory is writable."),
            Self::ContactSupport => Some("The server sent an unexpected response."),
        }
    }
}
