use chrono::NaiveDate;
use dupefind::config::{ConfigError, Settings};
use dupefind::duplicates::UnreadablePolicy;
use dupefind::output::OutputFormat;
use dupefind::scanner::{DateOperator, SizeUnit};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_settings_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = Figment::from(Serialized::defaults(Settings::default()));
    let settings = Settings::from_figment(&figment).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.session_config().hash_threads, 1);
}

#[test]
fn test_settings_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
hash_threads = 4
unreadable = "exclude"
output = "csv"

[filter]
min_size = 0.5
max_size = 100.0
size_unit = "bytes"
extensions = [".JPG", "png", ""]
name_contains = "holiday"
include_subfolders = true

[filter.modified]
operator = ">="
date = "2024-01-01"

[filter.created]
operator = "~"
date = "2024-01-01"
"#;
    fs::write(&config_path, toml_content).unwrap();

    let settings = Settings::load(Some(&config_path)).unwrap();

    assert_eq!(settings.hash_threads, 4);
    assert_eq!(settings.unreadable, UnreadablePolicy::Exclude);
    assert_eq!(settings.output, OutputFormat::Csv);

    let filter = &settings.filter;
    assert_eq!(filter.size_unit, SizeUnit::Bytes);
    assert!((filter.min_size - 0.5).abs() < f64::EPSILON);
    let exts: Vec<&str> = filter.extensions.iter().map(String::as_str).collect();
    assert_eq!(exts, vec!["jpg", "png"]);
    assert_eq!(filter.name_contains, "holiday");
    assert!(filter.include_subfolders);
    assert_eq!(filter.modified.operator, DateOperator::AfterOrEqual);
    assert_eq!(filter.modified.date, NaiveDate::from_ymd_opt(2024, 1, 1));
    // Unknown operators mean no constraint
    assert_eq!(filter.created.operator, DateOperator::Any);
    assert!(filter.created.allows(NaiveDate::from_ymd_opt(1999, 12, 31)));
}

#[test]
fn test_settings_load_from_env() {
    std::env::set_var("DUPEFIND_PROGRESS_INTERVAL_MS", "250");
    // Use double underscore for nesting
    std::env::set_var("DUPEFIND_FILTER__MAX_SIZE", "1000000");

    let figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Env::prefixed("DUPEFIND_").split("__"));
    let settings = Settings::from_figment(&figment).unwrap();

    assert_eq!(settings.progress_interval(), Duration::from_millis(250));
    assert!((settings.filter.max_size - 1_000_000.0).abs() < f64::EPSILON);

    // Clean up
    std::env::remove_var("DUPEFIND_PROGRESS_INTERVAL_MS");
    std::env::remove_var("DUPEFIND_FILTER__MAX_SIZE");
}

#[test]
fn test_later_layers_override_earlier() {
    let temp_dir = tempdir().unwrap();
    let base = temp_dir.path().join("base.toml");
    let overlay = temp_dir.path().join("overlay.toml");
    fs::write(&base, "hash_threads = 2\noutput = \"json\"\n").unwrap();
    fs::write(&overlay, "hash_threads = 8\n").unwrap();

    let figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::file(&base))
        .merge(Toml::file(&overlay));
    let settings = Settings::from_figment(&figment).unwrap();

    assert_eq!(settings.hash_threads, 8);
    assert_eq!(settings.output, OutputFormat::Json);
}

#[test]
fn test_zero_hash_threads_clamped() {
    let figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::string("hash_threads = 0"));
    let settings = Settings::from_figment(&figment).unwrap();
    assert_eq!(settings.hash_threads, 1);
}

#[test]
fn test_invalid_toml_is_reported() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("broken.toml");
    fs::write(&config_path, "hash_threads = \"many\"\n").unwrap();

    let err = Settings::load(Some(&config_path)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().starts_with("Invalid configuration"));
}

#[test]
fn test_missing_explicit_file() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("absent.toml");
    assert!(matches!(
        Settings::load(Some(&missing)),
        Err(ConfigError::NotFound(path)) if path == missing
    ));
}
