//! CLI configuration file

use dayplan_http::HttpBackendConfig;
use dayplan_session::{ConfigError, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `[session]` and `[http]` tables; missing tables keep their defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Editing session settings
    pub session: SessionConfig,
    /// Remote backend settings
    pub http: HttpBackendConfig,
}

impl CliConfig {
    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML or the session settings are out of range
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.session.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
