//! Config loading and defaults.

use cbhs_core::config::CbhsConfig;
use cbhs_core::NormalizationMode;
use std::path::{Path, PathBuf};

#[test]
fn config_load_default() {
    let c = CbhsConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.model.n_estimators, 100);
    assert_eq!(c.model.contamination, 0.05);
    assert_eq!(c.model.seed, 42);
    assert_eq!(c.model.normalization, NormalizationMode::Batch);
    assert_eq!(c.auth.threshold, 0.5);
    assert_eq!(c.synthetic.bootstrap_samples, 50);
    assert!(c.log.json);
}

#[test]
fn partial_config_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"data_dir": "/var/lib/cbhs", "model": {"normalization": "fitted", "n_estimators": 10}, "auth": {"threshold": 0.3}}"#,
    )
    .unwrap();
    let c = CbhsConfig::load(&path);
    assert_eq!(c.data_dir, PathBuf::from("/var/lib/cbhs"));
    assert_eq!(c.model.normalization, NormalizationMode::Fitted);
    assert_eq!(c.model.n_estimators, 10);
    assert_eq!(c.model.max_samples, 256);
    assert_eq!(c.auth.threshold, 0.3);
    assert_eq!(c.auth.high_threshold, 0.8);
    assert_eq!(c.resolved_model_path(), PathBuf::from("/var/lib/cbhs/cbhs_model.json"));
}

#[test]
fn invalid_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    let c = CbhsConfig::load(&path);
    assert_eq!(c.model.n_estimators, 100);
}
