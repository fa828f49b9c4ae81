//! CLI configuration.
//!
//! Values come from, in increasing precedence: built-in defaults, an
//! optional YAML file, `OWC_*` environment variables (a `.env` file is
//! loaded first by the binary) and command-line flags.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const WMS_VERSIONS: [&str; 2] = ["1.1.1", "1.3.0"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Top-level CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// One of trace, debug, info, warn, error
    pub log_level: String,

    /// Emit logs as JSON lines instead of plain text
    pub log_json: bool,

    /// Timeout for capabilities requests (seconds)
    pub http_timeout_secs: u64,

    pub user_agent: String,

    /// WMS version requested when fetching capabilities
    pub default_wms_version: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_json: false,
            http_timeout_secs: 30,
            user_agent: format!("owc/{}", env!("CARGO_PKG_VERSION")),
            default_wms_version: wms_protocol::DEFAULT_VERSION.to_string(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a YAML file; missing keys take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    /// Apply `OWC_*` environment variables on top of `self`.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("OWC_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(json) = lookup("OWC_LOG_JSON") {
            self.log_json = parse_bool("OWC_LOG_JSON", &json)?;
        }
        if let Some(timeout) = lookup("OWC_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs =
                timeout
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "OWC_HTTP_TIMEOUT_SECS".to_string(),
                        message: format!("'{}' is not a number of seconds", timeout),
                    })?;
        }
        if let Some(agent) = lookup("OWC_USER_AGENT") {
            self.user_agent = agent;
        }
        if let Some(version) = lookup("OWC_DEFAULT_WMS_VERSION") {
            self.default_wms_version = version;
        }
        Ok(self)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "log_level".to_string(),
                message: format!(
                    "'{}' is not one of {}",
                    self.log_level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "http_timeout_secs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if !WMS_VERSIONS.contains(&self.default_wms_version.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "default_wms_version".to_string(),
                message: format!(
                    "'{}' is not one of {}",
                    self.default_wms_version,
                    WMS_VERSIONS.join(", ")
                ),
            });
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{}' is not a boolean", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = CliConfig::default();
        config.validate().unwrap();
        assert_eq!(config.default_wms_version, "1.3.0");
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level: debug\nhttp_timeout_secs: 5").unwrap();

        let config = CliConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.http_timeout_secs, 5);
        assert!(!config.log_json);
    }

    #[test]
    fn test_from_file_missing() {
        let err = CliConfig::from_file("/nonexistent/owc.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "http_timeout_secs: [1, 2").unwrap();
        assert!(matches!(
            CliConfig::from_file(file.path()),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("OWC_LOG_LEVEL", "trace"),
            ("OWC_LOG_JSON", "yes"),
            ("OWC_HTTP_TIMEOUT_SECS", "12"),
            ("OWC_DEFAULT_WMS_VERSION", "1.1.1"),
        ]
        .into_iter()
        .collect();

        let config = CliConfig::default()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.log_level, "trace");
        assert!(config.log_json);
        assert_eq!(config.http_timeout_secs, 12);
        assert_eq!(config.default_wms_version, "1.1.1");
        config.validate().unwrap();
    }

    #[test]
    fn test_bad_override() {
        let err = CliConfig::default()
            .with_overrides(|k| (k == "OWC_HTTP_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_validate_rejects() {
        let config = CliConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CliConfig {
            default_wms_version: "2.0".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
