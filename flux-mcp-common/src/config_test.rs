//! Property-based tests for the configuration module.
//!
//! These tests drive `Config::from_lookup` with in-memory variable maps so no
//! process environment is touched.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::config::{
    Config, DEFAULT_API_BASE_URL, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_INTERVAL_MS,
    DEFAULT_POLL_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::error::ConfigError;

fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|name| map.get(name).cloned())
}

#[test]
fn defaults_apply_when_nothing_is_set() {
    let config = config_from(&[]).unwrap();
    assert!(config.api_key.is_none());
    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    assert_eq!(config.poll_max_interval_ms, DEFAULT_POLL_MAX_INTERVAL_MS);
    assert_eq!(config.poll_timeout_secs, DEFAULT_POLL_TIMEOUT_SECS);
    assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
}

#[test]
fn default_matches_empty_environment() {
    let from_env = config_from(&[]).unwrap();
    let default = Config::default();
    assert_eq!(from_env.api_base_url, default.api_base_url);
    assert_eq!(from_env.poll_timeout_secs, default.poll_timeout_secs);
}

#[test]
fn api_key_is_read_and_blank_key_ignored() {
    let config = config_from(&[("BFL_API_KEY", "abc-123")]).unwrap();
    assert_eq!(config.api_key.unwrap().expose(), "abc-123");

    let config = config_from(&[("BFL_API_KEY", "   ")]).unwrap();
    assert!(config.api_key.is_none());
}

#[test]
fn base_url_trailing_slash_is_stripped() {
    let config = config_from(&[("BFL_API_URL", "http://localhost:9999/v1/")]).unwrap();
    assert_eq!(config.api_base_url, "http://localhost:9999/v1");
}

#[test]
fn invalid_number_is_reported_with_variable_name() {
    let err = config_from(&[("FLUX_POLL_TIMEOUT_SECS", "soon")]).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "FLUX_POLL_TIMEOUT_SECS"));
    assert!(err.to_string().contains("soon"));
}

#[test]
fn zero_poll_interval_is_rejected() {
    let err = config_from(&[("FLUX_POLL_INTERVAL_MS", "0")]).unwrap_err();
    assert!(err.to_string().contains("FLUX_POLL_INTERVAL_MS"));
}

#[test]
fn max_interval_below_initial_is_rejected() {
    let err = config_from(&[
        ("FLUX_POLL_INTERVAL_MS", "2000"),
        ("FLUX_POLL_MAX_INTERVAL_MS", "1000"),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("FLUX_POLL_MAX_INTERVAL_MS"));
}

#[test]
fn port_is_not_read_from_the_lookup() {
    // PORT belongs to the transport arguments; a bad value must not fail config loading
    let config = config_from(&[("PORT", "not-a-port")]).unwrap();
    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
}

#[test]
fn zero_timeout_is_rejected() {
    assert!(config_from(&[("FLUX_POLL_TIMEOUT_SECS", "0")]).is_err());
}

proptest! {
    /// Consistent interval pairs are always accepted
    #[test]
    fn consistent_intervals_are_accepted(
        initial in 1u64..10_000u64,
        extra in 0u64..60_000u64,
        timeout in 1u64..3_600u64,
    ) {
        let initial_str = initial.to_string();
        let max_str = (initial + extra).to_string();
        let timeout_str = timeout.to_string();
        let config = config_from(&[
            ("FLUX_POLL_INTERVAL_MS", initial_str.as_str()),
            ("FLUX_POLL_MAX_INTERVAL_MS", max_str.as_str()),
            ("FLUX_POLL_TIMEOUT_SECS", timeout_str.as_str()),
        ]).unwrap();
        prop_assert_eq!(config.poll_interval_ms, initial);
        prop_assert_eq!(config.poll_max_interval_ms, initial + extra);
        prop_assert_eq!(config.poll_timeout_secs, timeout);
    }
}
