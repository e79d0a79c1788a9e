//! Integration tests for the configuration system.
//!
//! Covers validation, presets, environment variable parsing and JSON file
//! round trips for every config type.

use super::*;
use crate::error::SylvaError;
use std::env;
use std::fs;
use tempfile::tempdir;

/// Test all configuration types can be created with default values
#[test]
fn test_all_config_defaults() {
    let queue = QueueConfig::default();
    assert!(queue.validate().is_ok());
    assert_eq!(queue.capacity, queue::DEFAULT_QUEUE_CAPACITY);

    let expiring = ExpiringSetConfig::default();
    assert!(expiring.validate().is_ok());
    assert_eq!(expiring.idle_period, Duration::from_secs(1));

    let session = SessionConfig::default();
    assert!(session.validate().is_ok());
    assert_eq!(session.expiration, Duration::from_secs(24 * 3600));
}

/// Test all preset configurations are valid
#[test]
fn test_all_presets_valid() {
    assert!(QueueConfig::performance_preset().validate().is_ok());
    assert!(QueueConfig::memory_preset().validate().is_ok());
    assert!(QueueConfig::realtime_preset().validate().is_ok());
    assert!(QueueConfig::balanced_preset().validate().is_ok());

    assert!(ExpiringSetConfig::performance_preset().validate().is_ok());
    assert!(ExpiringSetConfig::memory_preset().validate().is_ok());
    assert!(ExpiringSetConfig::realtime_preset().validate().is_ok());
    assert!(ExpiringSetConfig::balanced_preset().validate().is_ok());

    assert!(SessionConfig::performance_preset().validate().is_ok());
    assert!(SessionConfig::memory_preset().validate().is_ok());
    assert!(SessionConfig::realtime_preset().validate().is_ok());
    assert!(SessionConfig::balanced_preset().validate().is_ok());
}

/// Test that presets differ where it matters
#[test]
fn test_preset_characteristics() {
    assert!(QueueConfig::performance_preset().capacity > QueueConfig::memory_preset().capacity);
    assert!(
        ExpiringSetConfig::realtime_preset().idle_period
            < ExpiringSetConfig::performance_preset().idle_period
    );
    assert!(
        SessionConfig::realtime_preset().gc_idle_period
            < SessionConfig::performance_preset().gc_idle_period
    );
}

/// Test zero values are rejected
#[test]
fn test_validation_edge_cases() {
    let queue = QueueConfig::with_capacity(0);
    assert!(matches!(queue.validate(), Err(SylvaError::Configuration { .. })));
    assert!(QueueConfig::with_capacity(1).validate().is_ok());

    let mut expiring = ExpiringSetConfig::with_ttl(Duration::ZERO);
    assert!(expiring.validate().is_err());
    expiring.ttl = Duration::from_millis(1);
    expiring.idle_period = Duration::ZERO;
    assert!(expiring.validate().is_err());

    let session = SessionConfig {
        expiration: Duration::from_secs(1),
        gc_idle_period: Duration::ZERO,
    };
    let err = session.validate().unwrap_err();
    assert!(err.to_string().contains("gc_idle_period"));
}

/// Test environment variable parsing with custom prefixes
#[test]
fn test_environment_variable_parsing() {
    env::set_var("TESTENV_QUEUE_CAPACITY", "77");
    env::set_var("TESTENV_EXPIRING_TTL_MS", "2500");
    env::set_var("TESTENV_EXPIRING_IDLE_MS", "40");
    env::set_var("TESTENV_SESSION_EXPIRATION_MS", "60000");

    let queue = QueueConfig::from_env_with_prefix("TESTENV_").unwrap();
    assert_eq!(queue.capacity, 77);

    let expiring = ExpiringSetConfig::from_env_with_prefix("TESTENV_").unwrap();
    assert_eq!(expiring.ttl, Duration::from_millis(2500));
    assert_eq!(expiring.idle_period, Duration::from_millis(40));

    let session = SessionConfig::from_env_with_prefix("TESTENV_").unwrap();
    assert_eq!(session.expiration, Duration::from_secs(60));
    assert_eq!(session.gc_idle_period, SessionConfig::default().gc_idle_period);

    env::remove_var("TESTENV_QUEUE_CAPACITY");
    env::remove_var("TESTENV_EXPIRING_TTL_MS");
    env::remove_var("TESTENV_EXPIRING_IDLE_MS");
    env::remove_var("TESTENV_SESSION_EXPIRATION_MS");
}

/// Test invalid environment values fall back or fail validation
#[test]
fn test_environment_invalid_values() {
    env::set_var("BADENV_QUEUE_CAPACITY", "not-a-number");
    let queue = QueueConfig::from_env_with_prefix("BADENV_").unwrap();
    assert_eq!(queue.capacity, QueueConfig::default().capacity);

    env::set_var("BADENV_QUEUE_CAPACITY", "0");
    assert!(QueueConfig::from_env_with_prefix("BADENV_").is_err());

    env::remove_var("BADENV_QUEUE_CAPACITY");
}

/// Test configurations survive a save and load through JSON files
#[test]
fn test_file_serialization() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let queue_path = temp_dir.path().join("queue.json");
    let queue = QueueConfig::with_capacity(3);
    queue.save_to_file(&queue_path)?;
    assert_eq!(QueueConfig::load_from_file(&queue_path)?, queue);

    let expiring_path = temp_dir.path().join("expiring.json");
    let expiring = ExpiringSetConfig::realtime_preset();
    expiring.save_to_file(&expiring_path)?;
    assert_eq!(ExpiringSetConfig::load_from_file(&expiring_path)?, expiring);

    let session_path = temp_dir.path().join("session.json");
    let session = SessionConfig::memory_preset();
    session.save_to_file(&session_path)?;
    assert_eq!(SessionConfig::load_from_file(&session_path)?, session);

    Ok(())
}

/// Test loading broken or invalid files reports the right error
#[test]
fn test_configuration_error_handling() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let missing = QueueConfig::load_from_file(temp_dir.path().join("absent.json"));
    assert!(matches!(missing, Err(SylvaError::Io(_))));

    let garbage_path = temp_dir.path().join("garbage.json");
    fs::write(&garbage_path, "{ not json").expect("write");
    let garbage = QueueConfig::load_from_file(&garbage_path);
    assert!(matches!(garbage, Err(SylvaError::Configuration { .. })));

    let invalid_path = temp_dir.path().join("invalid.json");
    fs::write(&invalid_path, r#"{ "capacity": 0 }"#).expect("write");
    let invalid = QueueConfig::load_from_file(&invalid_path);
    assert!(matches!(invalid, Err(SylvaError::Configuration { .. })));
}
