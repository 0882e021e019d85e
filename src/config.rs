//! Host configuration.
//!
//! Loaded from TOML or JSON, then overridden from the environment.
//! `REACT_SERVER_HOST` is honored for compatibility with existing launchers.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub server: ServerConfig,
    pub window: WindowConfig,
    pub snapshot: SnapshotConfig,
    pub logging: LoggingConfig,
}

/// Where the script engine listens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5000,
        }
    }
}

/// Size of the visual root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            scale: 1.0,
        }
    }
}

/// Snapshot output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Directory for snapshot files; the system temp dir when unset.
    pub directory: Option<PathBuf>,
    pub default_format: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            directory: None,
            default_format: "png".to_string(),
        }
    }
}

impl SnapshotConfig {
    pub fn directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(env::temp_dir)
    }
}

/// tracing filter directive, e.g. `"spark_host=debug"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: Option<String>,
}

impl HostConfig {
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Override fields from `REACT_SERVER_HOST` and `REACT_SERVER_PORT`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = env::var("REACT_SERVER_HOST") {
            if !host.is_empty() {
                self.server.host = host;
            }
        }
        if let Ok(port) = env::var("REACT_SERVER_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(target: "config", %port, "ignoring invalid REACT_SERVER_PORT"),
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server port must be non-zero".into()));
        }
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "window size must be positive, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.window.scale <= 0.0 {
            return Err(ConfigError::Validation("window scale must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.snapshot.default_format, "png");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = HostConfig::from_toml_str(
            r#"
            [server]
            port = 8081

            [window]
            width = 320.0
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.window.width, 320.0);
        assert_eq!(config.window.height, 600.0);
    }

    #[test]
    fn test_json() {
        let config = HostConfig::from_json_str(r#"{"server": {"host": "10.0.0.2"}}"#).unwrap();
        assert_eq!(config.server.host, "10.0.0.2");
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            HostConfig::from_toml_str("[server\nport = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = HostConfig::default();
        config.window.width = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = HostConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }
}
