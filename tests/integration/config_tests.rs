//! Configuration layering: defaults, TOML file, then environment.

use mostsimilar::config::{Config, ConfigError};
use mostsimilar::similarity::Metric;
use mostsimilar::text::CaseFolding;
use std::fs;
use tempfile::tempdir;

/// Clear all MOSTSIMILAR_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("MOSTSIMILAR_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_missing_file_gives_defaults() {
    let _guard = crate::env_lock();
    clear_env();
    let dir = tempdir().unwrap();

    let config = Config::load_from_path(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_file_values_are_applied() {
    let _guard = crate::env_lock();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "metric = \"euclidean\"\ncase_folding = \"unicode-bmp\"\nthreads = 6\n",
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.metric, Metric::Euclidean);
    assert_eq!(config.case_folding, CaseFolding::UnicodeBmp);
    assert_eq!(config.threads, Some(6));
    assert_eq!(config.dedup_threshold, 1.0);
}

#[test]
fn test_environment_overrides_file() {
    let _guard = crate::env_lock();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "metric = \"euclidean\"\ndedup_threshold = 0.9\n").unwrap();

    std::env::set_var("MOSTSIMILAR_METRIC", "simhash");
    std::env::set_var("MOSTSIMILAR_DEDUP_THRESHOLD", "0.75");
    let result = Config::load_from_path(&path);
    clear_env();

    let config = result.unwrap();
    assert_eq!(config.metric, Metric::SimHash);
    assert_eq!(config.dedup_threshold, 0.75);
}

#[test]
fn test_environment_value_is_validated() {
    let _guard = crate::env_lock();
    clear_env();
    let dir = tempdir().unwrap();

    std::env::set_var("MOSTSIMILAR_THREADS", "0");
    let result = Config::load_from_path(&dir.path().join("absent.toml"));
    clear_env();

    assert!(matches!(
        result,
        Err(ConfigError::Invalid { key: "threads", .. })
    ));
}

#[test]
fn test_malformed_toml_is_rejected() {
    let _guard = crate::env_lock();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "metric = [unclosed").unwrap();

    assert!(matches!(
        Config::load_from_path(&path),
        Err(ConfigError::Figment(_))
    ));
}

#[test]
fn test_saved_config_loads_back() {
    let _guard = crate::env_lock();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let config = Config {
        metric: Metric::SimHash,
        extra_stop_words: vec!["lorem".to_string()],
        parallel_scoring: false,
        ..Config::default()
    };

    config.save_to_path(&path).unwrap();
    assert_eq!(Config::load_from_path(&path).unwrap(), config);
}
