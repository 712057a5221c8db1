//! Configuration loading
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ENV_DATABASE: &str = "LEADBOARD_DATABASE";
pub const ENV_BIND: &str = "LEADBOARD_BIND";
pub const ENV_OPENAI_KEY: &str = "OPENAI_API_KEY";
pub const ENV_AGENT_KEY: &str = "LEADBOARD_AGENT_KEY";
pub const ENV_INSTRUMENT: &str = "LEADBOARD_INSTRUMENT";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub logging: LoggingConfig,
    pub classifier: ClassifierConfig,
    pub assessment: AssessmentConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Outbound chat-completions settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.3,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    /// Questionnaire instrument name (`aesthetic` or `retail`)
    pub instrument: String,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            instrument: "aesthetic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared key required on every route except health; unset disables the check
    pub agent_key: Option<String>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub log_level: Option<String>,
    pub instrument: Option<String>,
}

/// Fully resolved service settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    pub bind_addr: String,
    pub log_level: String,
    pub classifier: ClassifierConfig,
    pub instrument: String,
    pub agent_key: Option<String>,
}

/// Load the TOML config file
///
/// An explicit path must exist and parse. Without one, the platform
/// default locations are tried and a missing file yields defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) => path,
            None => {
                debug!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// First existing config file among the platform locations
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("leadboard").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/leadboard/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("leadboard"))
        .unwrap_or_else(|| PathBuf::from("./leadboard_data"))
        .join("leadboard.db")
}

/// Pick the first of command line, environment variable, config value
pub fn resolve_setting(
    cli_arg: Option<&str>,
    env_var_name: &str,
    config_value: Option<&str>,
) -> Option<String> {
    if let Some(value) = cli_arg {
        return Some(value.to_string());
    }

    if let Ok(value) = std::env::var(env_var_name) {
        if !value.is_empty() {
            return Some(value);
        }
    }

    config_value.map(str::to_string)
}

/// Merge command line, environment and TOML into final settings
pub fn resolve_settings(cli: &CliOverrides, toml: TomlConfig) -> Settings {
    let database_path = resolve_setting(
        cli.database_path.as_deref().and_then(Path::to_str),
        ENV_DATABASE,
        toml.database_path.as_deref().and_then(Path::to_str),
    )
    .map(PathBuf::from)
    .unwrap_or_else(default_database_path);

    let bind_addr = resolve_setting(cli.bind_addr.as_deref(), ENV_BIND, toml.bind_addr.as_deref())
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| toml.logging.level.clone());

    let instrument = resolve_setting(
        cli.instrument.as_deref(),
        ENV_INSTRUMENT,
        Some(toml.assessment.instrument.as_str()),
    )
    .unwrap_or_else(|| AssessmentConfig::default().instrument);

    let mut classifier = toml.classifier;
    classifier.api_key = resolve_setting(None, ENV_OPENAI_KEY, classifier.api_key.as_deref())
        .filter(|k| !k.trim().is_empty());

    let agent_key = resolve_setting(None, ENV_AGENT_KEY, toml.auth.agent_key.as_deref())
        .filter(|k| !k.trim().is_empty());

    Settings {
        database_path,
        bind_addr,
        log_level,
        classifier,
        instrument,
        agent_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_database_path_ends_with_file_name() {
        let path = default_database_path();
        assert!(path.ends_with("leadboard/leadboard.db"));
    }

    #[test]
    fn test_partial_toml_keeps_section_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [classifier]
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();

        assert_eq!(config.classifier.model, "gpt-4o-mini");
        assert_eq!(config.classifier.timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.assessment.instrument, "aesthetic");
        assert!(config.auth.agent_key.is_none());
    }
}
