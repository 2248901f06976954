//! Session configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// TOML did not parse
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Editing session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of search results requested
    pub search_limit: usize,
    /// Queries shorter than this clear results without a request
    pub min_search_query_len: usize,
    /// City used to scope place search
    pub city_scope: Option<String>,
    /// Maximum wish length in characters
    pub max_wish_len: usize,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With search result limit
    #[inline]
    #[must_use]
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// With minimum query length
    #[inline]
    #[must_use]
    pub fn with_min_search_query_len(mut self, len: usize) -> Self {
        self.min_search_query_len = len;
        self
    }

    /// With city scope
    #[inline]
    #[must_use]
    pub fn with_city_scope(mut self, city: impl Into<String>) -> Self {
        self.city_scope = Some(city.into());
        self
    }

    /// With maximum wish length
    #[inline]
    #[must_use]
    pub fn with_max_wish_len(mut self, len: usize) -> Self {
        self.max_wish_len = len;
        self
    }

    /// Parse from TOML text; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML or fails validation
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
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

    /// Check value ranges
    ///
    /// # Errors
    /// Returns error if a limit is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "search_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_wish_len == 0 {
            return Err(ConfigError::Invalid {
                field: "max_wish_len",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.city_scope.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "city_scope",
                reason: "must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            search_limit: 10,
            min_search_query_len: 2,
            city_scope: None,
            max_wish_len: 500,
        }
    }
}
