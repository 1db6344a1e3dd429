//! Property-based tests for error module.
//!
//! These tests check that error messages keep the context callers rely on and
//! that every variant lands in a stable category.

use proptest::prelude::*;

use crate::error::{ConfigError, Error, ErrorKind};

/// Generate valid HTTP status codes (100-599)
fn http_status_strategy() -> impl Strategy<Value = u16> {
    100u16..600u16
}

/// Generate service endpoint URLs
fn endpoint_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("https://api\\.[a-z]{2,8}\\.ai/v1/[a-z-]{3,20}")
        .unwrap()
        .prop_filter("endpoint must be non-empty", |s| !s.is_empty())
}

/// Generate error messages
fn message_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ]{1,100}"
}

/// Generate one error of every category
fn any_error_strategy() -> impl Strategy<Value = Error> {
    prop_oneof![
        message_strategy().prop_map(Error::validation),
        message_strategy().prop_map(Error::authentication),
        (400u16..500u16, message_strategy()).prop_map(|(s, m)| Error::rejected(s, m)),
        message_strategy().prop_map(Error::transport),
        message_strategy().prop_map(Error::service_failure),
        (1u64..600u64, 0u32..1000u32).prop_map(|(s, a)| Error::timeout(s, a)),
        (0u32..1000u32).prop_map(Error::cancelled),
        (endpoint_strategy(), http_status_strategy(), message_strategy())
            .prop_map(|(e, s, m)| Error::api(e, s, m)),
        message_strategy().prop_map(Error::internal),
    ]
}

proptest! {
    /// API errors always carry endpoint, status and message
    #[test]
    fn api_error_contains_context(
        endpoint in endpoint_strategy(),
        status in http_status_strategy(),
        message in message_strategy(),
    ) {
        let err = Error::api(&endpoint, status, &message);
        let msg = err.to_string();

        prop_assert!(msg.contains(&endpoint), "Error message should contain endpoint: {}", msg);
        prop_assert!(msg.contains(&status.to_string()), "Error message should contain status: {}", msg);
        prop_assert!(msg.contains(&message), "Error message should contain message: {}", msg);
    }

    /// Service failure reasons are propagated verbatim
    #[test]
    fn service_failure_preserves_reason(reason in message_strategy()) {
        let err = Error::service_failure(&reason);
        prop_assert!(err.to_string().contains(&reason));
        prop_assert_eq!(err.kind(), ErrorKind::ServiceFailure);
    }

    /// Rejections keep the status code and body
    #[test]
    fn rejected_contains_status_and_body(
        status in 400u16..500u16,
        body in message_strategy(),
    ) {
        let err = Error::rejected(status, &body);
        let msg = err.to_string();
        prop_assert!(msg.contains(&status.to_string()));
        prop_assert!(msg.contains(&body));
        prop_assert_eq!(err.kind(), ErrorKind::Rejected);
    }

    /// Every error has a non-empty type name ending in "Error" and non-empty diagnostics
    #[test]
    fn every_error_is_labelled(err in any_error_strategy()) {
        let name = err.type_name();
        prop_assert!(name.ends_with("Error"), "type name {} should end with Error", name);
        prop_assert!(!err.to_string().is_empty());

        let diagnostics = err.diagnostics();
        prop_assert!(diagnostics.starts_with(name));
    }

    /// Only the catch-all variants are unknown
    #[test]
    fn unknown_kind_only_for_uncategorized(err in any_error_strategy()) {
        let uncategorized = matches!(err, Error::Api { .. } | Error::Internal(_));
        prop_assert_eq!(err.kind() == ErrorKind::Unknown, uncategorized);
    }
}

#[test]
fn test_diagnostics_include_source_chain() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "cannot read config/.env");
    let err: Error = io_err.into();
    let diagnostics = err.diagnostics();
    assert!(diagnostics.starts_with("IoError"));
    assert!(diagnostics.contains("cannot read config/.env"));
    assert!(diagnostics.contains("PermissionDenied"));
}

#[test]
fn test_config_error_is_unknown_kind() {
    let err: Error = ConfigError::invalid_value("FLUX_POLL_TIMEOUT_SECS", "not a number").into();
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert!(err.diagnostics().contains("FLUX_POLL_TIMEOUT_SECS"));
}

#[test]
fn test_cancelled_and_timeout_are_distinct() {
    let cancelled = Error::cancelled(3);
    let timed_out = Error::timeout(60, 3);
    assert_ne!(cancelled.kind(), timed_out.kind());
    assert_eq!(cancelled.type_name(), "CancelledError");
    assert_eq!(timed_out.type_name(), "TimeoutError");
}
