//! HTTP backend configuration

use serde::{Deserialize, Serialize};

/// Connection settings for [`crate::HttpDayBackend`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpBackendConfig {
    /// API root, e.g. `https://api.example.com/v1`
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Bearer token sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl HttpBackendConfig {
    /// Configuration for `base_url` with default timeout and no token
    #[inline]
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// With bearer token
    #[inline]
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_secs: 15,
            auth_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: HttpBackendConfig =
            toml::from_str(r#"base_url = "https://api.example.com/v1""#).unwrap();
        assert_eq!(config.base_url, "https://api.example.com/v1");
        assert_eq!(config.timeout_secs, 15);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn builders() {
        let config = HttpBackendConfig::new("http://localhost:9000")
            .with_timeout_secs(3)
            .with_auth_token("secret");
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
    }
}
