//! Server configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! command-line flags and their environment variables. Every layer is optional
//! and later layers win key by key.

use axum::http::HeaderValue;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_MODEL_FILE: &str = "heart_model.toml";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
/// The local frontend dev server.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid CORS origin '{0}'")]
    InvalidOrigin(String),
}

/// One configuration layer. Unset keys defer to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub model: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub allow_origins: Option<Vec<String>>,
}

impl ConfigLayer {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Keys set in `other` replace the ones in `self`.
    pub fn merge(self, other: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            model: other.model.or(self.model),
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            allow_origins: other.allow_origins.or(self.allow_origins),
        }
    }
}

/// Fully resolved settings for the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub model_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub allow_origins: Vec<String>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_FILE),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allow_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

impl ServeConfig {
    /// Applies the optional file layer and then the command-line layer on top of
    /// the defaults.
    pub fn resolve(file: Option<&Path>, overrides: ConfigLayer) -> Result<Self, ConfigError> {
        let file_layer = match file {
            Some(path) => ConfigLayer::from_file(path)?,
            None => ConfigLayer::default(),
        };
        let layer = file_layer.merge(overrides);
        let defaults = ServeConfig::default();
        let config = ServeConfig {
            model_path: layer.model.unwrap_or(defaults.model_path),
            host: layer.host.unwrap_or(defaults.host),
            port: layer.port.unwrap_or(defaults.port),
            allow_origins: layer.allow_origins.unwrap_or(defaults.allow_origins),
        };
        config.origin_headers()?;
        Ok(config)
    }

    /// The listen address in `host:port` form.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Allowed origins as header values, rejecting anything that cannot be sent
    /// back in `Access-Control-Allow-Origin`.
    pub fn origin_headers(&self) -> Result<Vec<HeaderValue>, ConfigError> {
        self.allow_origins
            .iter()
            .map(|origin| {
                let trimmed = origin.trim();
                if trimmed.is_empty() || trimmed == "*" {
                    return Err(ConfigError::InvalidOrigin(origin.clone()));
                }
                HeaderValue::from_str(trimmed)
                    .map_err(|_| ConfigError::InvalidOrigin(origin.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_local_development_setup() {
        let config = ServeConfig::resolve(None, ConfigLayer::default()).unwrap();
        assert_eq!(config.model_path, PathBuf::from("heart_model.toml"));
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
        assert_eq!(
            config.allow_origins,
            vec!["http://localhost:5173", "http://127.0.0.1:5173"]
        );
    }

    #[test]
    fn command_line_layer_overrides_file_layer() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "model = \"models/prod.toml\"\nport = 9000\nallow_origins = [\"https://app.example.org\"]"
        )
        .unwrap();
        file.flush().unwrap();

        let overrides = ConfigLayer {
            port: Some(9100),
            ..ConfigLayer::default()
        };
        let config = ServeConfig::resolve(Some(file.path()), overrides).unwrap();
        assert_eq!(config.model_path, PathBuf::from("models/prod.toml"));
        assert_eq!(config.port, 9100);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.allow_origins, vec!["https://app.example.org"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ConfigLayer::from_toml_str("modle = \"typo.toml\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_config_file_is_reported_with_path() {
        let err = ServeConfig::resolve(Some(Path::new("nope/server.toml")), ConfigLayer::default())
            .unwrap_err();
        assert!(err.to_string().contains("nope/server.toml"));
    }

    #[test]
    fn wildcard_and_malformed_origins_are_rejected() {
        for bad in ["*", "", "http://bad\norigin"] {
            let overrides = ConfigLayer {
                allow_origins: Some(vec![bad.to_string()]),
                ..ConfigLayer::default()
            };
            assert!(matches!(
                ServeConfig::resolve(None, overrides),
                Err(ConfigError::InvalidOrigin(_))
            ));
        }
    }
}
