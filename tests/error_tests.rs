//! Tests for the error system.

use std::sync::Arc;

use bellbook::auth::AuthError;
use bellbook::error::unified::*;
use bellbook::error::*;

#[test]
fn api_error_displays_detail_only() {
    let err = BellbookError::api(404, "Announcement not found");
    assert!(matches!(&err, BellbookError::Api { status: 404, .. }));
    assert_eq!(err.to_string(), "Announcement not found");
}

#[test]
fn error_helper_mappings_are_stable_for_major_variants() {
    struct Case {
        error: BellbookError,
        expected_category: ErrorCategory,
        expected_retryable: bool,
        expected_recovery: RecoverySuggestion,
    }

    let network_error = reqwest::Client::new()
        .get("http://[::1")
        .build()
        .unwrap_err();
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "disk");
    let serde_error = serde_json::from_str::<serde_json::Value>("{not-json}").unwrap_err();

    let cases = vec![
        Case {
            error: BellbookError::Unauthorized,
            expected_category: ErrorCategory::Authentication,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::SignInAgain,
        },
        Case {
            error: BellbookError::api(429, "slow down"),
            expected_category: ErrorCategory::RateLimit,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: BellbookError::api(503, GENERIC_FAILURE),
            expected_category: ErrorCategory::Server,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: BellbookError::api(400, "Invalid OTP"),
            expected_category: ErrorCategory::Validation,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ShowToUser,
        },
        Case {
            error: BellbookError::Configuration("bad-config".to_string()),
            expected_category: ErrorCategory::Configuration,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckConfiguration,
        },
        Case {
            error: BellbookError::Network(network_error),
            expected_category: ErrorCategory::Network,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: BellbookError::Io(io_error),
            expected_category: ErrorCategory::Storage,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckStorage,
        },
        Case {
            error: BellbookError::Serialization(serde_error),
            expected_category: ErrorCategory::Serialization,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
    ];

    for case in cases {
        assert_eq!(case.error.category(), case.expected_category, "{}", case.error);
        assert_eq!(case.error.is_retryable(), case.expected_retryable, "{}", case.error);
        assert_eq!(
            case.error.recovery_suggestion(),
            case.expected_recovery,
            "{}",
            case.error
        );
    }
}

#[test]
fn shared_errors_keep_their_classification() {
    let shared = Arc::new(BellbookError::Unauthorized);
    let first = BellbookError::from(shared.clone());
    assert!(first.is_unauthorized());
    assert_eq!(first.to_string(), "Unauthorized");
    assert_eq!(first.category(), ErrorCategory::Authentication);
    drop(first);

    let last = BellbookError::from(shared);
    assert!(matches!(last, BellbookError::Unauthorized));
}

#[test]
fn auth_errors_convert_by_severity() {
    assert!(BellbookError::from(AuthError::NotLoggedIn).is_unauthorized());
    assert!(BellbookError::from(AuthError::RefreshRejected).is_unauthorized());
    let storage = BellbookError::from(AuthError::Io("read-only".into()));
    assert_eq!(storage.category(), ErrorCategory::Storage);
}

#[test]
fn recovery_hints_are_terminal_friendly() {
    assert!(RecoverySuggestion::SignInAgain.hint().unwrap().contains("auth login"));
    assert_eq!(RecoverySuggestion::ShowToUser.hint(), None);
}
