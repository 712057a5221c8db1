//! Configuration loading and priority resolution
//!
//! Tests that touch LEADBOARD_* / OPENAI_API_KEY are marked #[serial] so
//! environment changes do not race.

use leadboard_common::config::{
    default_database_path, load_toml_config, resolve_setting, resolve_settings, CliOverrides,
    TomlConfig, DEFAULT_BIND_ADDR, ENV_AGENT_KEY, ENV_BIND, ENV_DATABASE, ENV_INSTRUMENT,
    ENV_OPENAI_KEY,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

fn clear_env() {
    for var in [ENV_DATABASE, ENV_BIND, ENV_OPENAI_KEY, ENV_AGENT_KEY, ENV_INSTRUMENT] {
        env::remove_var(var);
    }
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_defaults_without_any_source() {
    clear_env();

    let settings = resolve_settings(&CliOverrides::default(), TomlConfig::default());

    assert_eq!(settings.database_path, default_database_path());
    assert_eq!(settings.bind_addr, DEFAULT_BIND_ADDR);
    assert_eq!(settings.log_level, "info");
    assert_eq!(settings.instrument, "aesthetic");
    assert_eq!(settings.classifier.model, "gpt-4o");
    assert!(settings.classifier.api_key.is_none());
    assert!(settings.agent_key.is_none());
}

#[test]
#[serial]
fn test_cli_beats_env_beats_toml() {
    clear_env();
    env::set_var(ENV_BIND, "127.0.0.1:7000");

    let toml = TomlConfig {
        bind_addr: Some("127.0.0.1:6000".to_string()),
        ..Default::default()
    };

    let from_env = resolve_settings(&CliOverrides::default(), toml.clone());
    assert_eq!(from_env.bind_addr, "127.0.0.1:7000");

    let cli = CliOverrides {
        bind_addr: Some("127.0.0.1:8000".to_string()),
        ..Default::default()
    };
    let from_cli = resolve_settings(&cli, toml.clone());
    assert_eq!(from_cli.bind_addr, "127.0.0.1:8000");

    env::remove_var(ENV_BIND);
    let from_toml = resolve_settings(&CliOverrides::default(), toml);
    assert_eq!(from_toml.bind_addr, "127.0.0.1:6000");
}

#[test]
#[serial]
fn test_empty_env_var_is_ignored() {
    clear_env();
    env::set_var(ENV_DATABASE, "");

    let resolved = resolve_setting(None, ENV_DATABASE, Some("/srv/leads.db"));
    assert_eq!(resolved.as_deref(), Some("/srv/leads.db"));

    env::remove_var(ENV_DATABASE);
}

#[test]
#[serial]
fn test_secrets_come_from_env_or_toml() {
    clear_env();
    env::set_var(ENV_OPENAI_KEY, "sk-env");

    let mut toml = TomlConfig::default();
    toml.classifier.api_key = Some("sk-toml".to_string());
    toml.auth.agent_key = Some("agent-toml".to_string());

    let settings = resolve_settings(&CliOverrides::default(), toml);
    assert_eq!(settings.classifier.api_key.as_deref(), Some("sk-env"));
    assert_eq!(settings.agent_key.as_deref(), Some("agent-toml"));

    clear_env();
}

#[test]
#[serial]
fn test_blank_api_key_disables_classifier() {
    clear_env();

    let mut toml = TomlConfig::default();
    toml.classifier.api_key = Some("   ".to_string());

    let settings = resolve_settings(&CliOverrides::default(), toml);
    assert!(settings.classifier.api_key.is_none());
}

#[test]
#[serial]
fn test_instrument_from_env() {
    clear_env();
    env::set_var(ENV_INSTRUMENT, "retail");

    let settings = resolve_settings(&CliOverrides::default(), TomlConfig::default());
    assert_eq!(settings.instrument, "retail");

    clear_env();
}

#[test]
fn test_load_explicit_config_file() {
    let file = write_config(
        r#"
        database_path = "/var/lib/leadboard/leads.db"
        bind_addr = "127.0.0.1:5050"

        [logging]
        level = "debug"

        [classifier]
        base_url = "http://localhost:9999"
        temperature = 0.1

        [assessment]
        instrument = "retail"

        [auth]
        agent_key = "secret"
        "#,
    );

    let config = load_toml_config(Some(file.path())).unwrap();

    assert_eq!(
        config.database_path,
        Some(PathBuf::from("/var/lib/leadboard/leads.db"))
    );
    assert_eq!(config.bind_addr.as_deref(), Some("127.0.0.1:5050"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.classifier.base_url, "http://localhost:9999");
    assert_eq!(config.classifier.model, "gpt-4o");
    assert!((config.classifier.temperature - 0.1).abs() < f32::EPSILON);
    assert_eq!(config.assessment.instrument, "retail");
    assert_eq!(config.auth.agent_key.as_deref(), Some("secret"));
}

#[test]
fn test_missing_explicit_config_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    assert!(load_toml_config(Some(&missing)).is_err());
}

#[test]
fn test_malformed_config_is_error() {
    let file = write_config("bind_addr = [not valid");
    assert!(load_toml_config(Some(file.path())).is_err());
}
