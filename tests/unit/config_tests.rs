// ============================
// tests/unit/config_tests.rs
// ============================
//! Settings validation as seen by an embedding process
use backend_lib::config::{ConfigError, LogFormat, Settings};

use crate::test_utils::test_settings;

#[test]
fn test_defaults_need_only_a_secret() {
    let mut settings = Settings::default();
    assert!(matches!(settings.validate(), Err(ConfigError::MissingSecret)));

    settings.auth.jwt_secret = "s3cret".to_string();
    settings.validate().unwrap();

    assert_eq!(settings.log_format, LogFormat::Text);
    assert_eq!(settings.auth.access_ttl_secs, 900);
    assert_eq!(settings.auth.refresh_ttl_secs, 604_800);
    assert!(settings.auth.cookie_secure);
    assert_eq!(settings.gateway.user_prefix, "/user/api/v1/");
    assert_eq!(settings.gateway.room_prefix, "/room/api/v1/");
    assert_eq!(settings.events.user_registered_queue, "user_registered");
}

#[test]
fn test_harness_settings_are_valid() {
    test_settings().validate().unwrap();
}

fn rejects(mutate: impl FnOnce(&mut Settings)) -> bool {
    let mut settings = test_settings();
    mutate(&mut settings);
    settings.validate().is_err()
}

#[test]
fn test_invalid_settings_are_rejected() {
    assert!(rejects(|s| s.auth.jwt_secret = "   ".to_string()), "whitespace secret");
    assert!(rejects(|s| s.auth.access_ttl_secs = 0), "zero access ttl");
    assert!(
        rejects(|s| s.auth.access_ttl_secs = s.auth.refresh_ttl_secs),
        "access ttl must be below refresh ttl"
    );
    assert!(rejects(|s| s.auth.refresh_ttl_secs = u64::MAX), "unbounded refresh ttl");
    assert!(rejects(|s| s.auth.bcrypt_cost = 3), "bcrypt cost too low");
    assert!(rejects(|s| s.auth.salt_len = 4), "short salt");
    assert!(rejects(|s| s.timeouts.rpc_ms = 0), "zero rpc timeout");
    assert!(rejects(|s| s.log_level = "loud".to_string()), "unknown log level");
    assert!(rejects(|s| s.gateway.room_prefix = "/room".to_string()), "prefix without slash");
    assert!(
        rejects(|s| s.gateway.room_prefix = s.gateway.user_prefix.clone()),
        "same prefixes"
    );
}
