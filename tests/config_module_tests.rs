// tests/config_module_tests.rs

use search_key_rotation::config::{load_config, AppConfig, ProviderConfig};
use search_key_rotation::{AppError, KeySelector};
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

const ENV_VARS: [&str; 4] = [
    "SEARCH_KEYS_PROVIDER_BRAVE_API_KEYS",
    "SEARCH_KEYS_PROVIDER_SERPER_API_KEYS",
    "SEARCH_KEYS_DEFAULT_PROVIDER",
    "SEARCH_KEYS_SEED",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write config");
    file
}

#[test]
#[serial]
fn test_load_yaml_config() {
    clear_env();
    let file = write_config(
        r#"
providers:
  - name: brave
    api_keys: "b1, b2,b3"
  - name: tavily
    api_keys: "t1"
default_provider: brave
selector:
  seed: 99
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.providers.len(), 2);
    assert_eq!(config.provider("brave").unwrap().key_count(), 3);
    assert_eq!(config.default_provider.as_deref(), Some("brave"));
    assert_eq!(config.selector.seed, Some(99));
    assert_eq!(config.total_keys(), 4);
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(&dir.path().join("absent.yaml")).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
#[serial]
fn test_empty_file_uses_defaults() {
    clear_env();
    let file = write_config("   \n");
    assert_eq!(load_config(file.path()).unwrap(), AppConfig::default());
}

#[test]
#[serial]
fn test_invalid_yaml_is_parse_error() {
    clear_env();
    let file = write_config("providers: [name: brave\n");
    assert!(matches!(
        load_config(file.path()),
        Err(AppError::ConfigParse { .. })
    ));
}

#[test]
#[serial]
fn test_unknown_field_is_rejected() {
    clear_env();
    let file = write_config("providers: []\nunexpected: true\n");
    assert!(matches!(
        load_config(file.path()),
        Err(AppError::ConfigParse { .. })
    ));
}

#[test]
#[serial]
fn test_unknown_default_provider_fails_validation() {
    clear_env();
    let file = write_config("providers:\n  - name: brave\n    api_keys: b1\ndefault_provider: bing\n");
    assert!(matches!(
        load_config(file.path()),
        Err(AppError::Config { .. })
    ));
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_env();
    let file = write_config("providers:\n  - name: brave\n    api_keys: old\n");
    env::set_var("SEARCH_KEYS_PROVIDER_BRAVE_API_KEYS", "new1,new2");
    env::set_var("SEARCH_KEYS_PROVIDER_SERPER_API_KEYS", "s1");
    env::set_var("SEARCH_KEYS_DEFAULT_PROVIDER", "serper");
    env::set_var("SEARCH_KEYS_SEED", "5");

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.provider("brave").unwrap().api_keys, "new1,new2");
    assert_eq!(config.provider("serper").unwrap().api_keys, "s1");
    assert_eq!(config.default_provider.as_deref(), Some("serper"));
    assert_eq!(config.selector.seed, Some(5));

    clear_env();
}

#[test]
fn test_selector_from_config() {
    let config = AppConfig {
        providers: vec![
            ProviderConfig::new("brave", "b1,b2"),
            ProviderConfig::new("tavily", "t1,shared"),
            ProviderConfig::new("serper", "shared"),
        ],
        default_provider: Some("brave".to_string()),
        ..AppConfig::default()
    };

    let selector = KeySelector::from_config(&config);
    assert_eq!(selector.registry().len(), 4);
    assert_eq!(selector.registry().provider_of("shared").as_deref(), Some("serper"));
    assert_eq!(selector.registry().all_keys_of("tavily"), vec!["t1"]);
}
