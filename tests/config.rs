use std::io::Write;

use kira_cvf::Engine;
use kira_cvf::config::{EngineConfig, MIN_SESSIONS_FLOOR};
use tempfile::{NamedTempFile, TempDir};

#[test]
fn defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.min_sessions, 14);
    assert_eq!(config.required_sessions(), 14);
    assert!((config.std_epsilon - 0.03).abs() < 1e-12);
    assert!((config.high_variance_ceiling() - 0.15).abs() < 1e-12);
    assert!(!config.renormalize_missing_domains);
    assert_eq!(config.min_timeline_points, 7);
    assert_eq!(config.horizon_weeks, 12);
    config.validate().unwrap();
}

#[test]
fn partial_json_fills_defaults() {
    let config = EngineConfig::from_json_str(r#"{"min_sessions": 20, "renormalize_missing_domains": true}"#)
        .unwrap();
    assert_eq!(config.min_sessions, 20);
    assert!(config.renormalize_missing_domains);
    assert_eq!(config.extended_sessions, 21);
    assert_eq!(config.velocity_window, 4);
}

#[test]
fn json_roundtrip() {
    let config = EngineConfig {
        uniform_prior: 0.05,
        horizon_weeks: 26,
        threads: 2,
        ..EngineConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let decoded = EngineConfig::from_json_str(&json).unwrap();
    assert_eq!(decoded, config);
}

#[test]
fn rejects_invalid_values() {
    let err = EngineConfig::from_json_str(r#"{"min_sessions": 4}"#).unwrap_err();
    assert!(format!("{err:#}").contains("min_sessions must be at least"));
    assert_eq!(MIN_SESSIONS_FLOOR, 5);

    for json in [
        r#"{"std_epsilon": 0.0}"#,
        r#"{"min_sessions": 30}"#,
        r#"{"noisy_domain_fraction": 1.5}"#,
        r#"{"confidence_decay": 1.0}"#,
        r#"{"velocity_window": 1}"#,
        r#"{"uniform_prior": -0.1}"#,
    ] {
        assert!(EngineConfig::from_json_str(json).is_err(), "{json} accepted");
    }
    assert!(EngineConfig::from_json_str("{not json").is_err());
}

#[test]
fn load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"min_sessions": 10, "extended_sessions": 15}}"#).unwrap();
    let config = EngineConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.min_sessions, 10);
    assert_eq!(config.extended_sessions, 15);

    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");
    let err = EngineConfig::load_from_file(&missing).unwrap_err();
    assert!(format!("{err:#}").contains("failed to read engine config"));
}

#[test]
fn engine_from_paths() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"min_sessions": 7}}"#).unwrap();
    let engine = Engine::from_paths(None, Some(file.path())).unwrap();
    assert_eq!(engine.config().min_sessions, 7);
    assert_eq!(engine.catalog().indicators().len(), 85);

    let bad = EngineConfig {
        min_sessions: 3,
        ..EngineConfig::default()
    };
    assert!(Engine::with_config(engine.catalog().clone(), bad).is_err());
}
