//! Client configuration: API key, default identifiers, endpoint and timeout.

use crate::error::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Public REST API v2 endpoint.
pub const API_BASE: &str = "https://api.newrelic.com/v2/";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable client configuration, validated at construction.
pub struct ClientConfig {
    api_key: SecretString,
    default_application_id: Option<String>,
    default_host_id: Option<String>,
    default_instance_id: Option<String>,
    base_url: Url,
    timeout: Duration,
    user_agent: String,
}

impl ClientConfig {
    /// Start a builder with the given REST API key.
    pub fn builder(api_key: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(api_key)
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub fn default_application_id(&self) -> Option<&str> {
        self.default_application_id.as_deref()
    }

    pub fn default_host_id(&self) -> Option<&str> {
        self.default_host_id.as_deref()
    }

    pub fn default_instance_id(&self) -> Option<&str> {
        self.default_instance_id.as_deref()
    }

    /// Base URL every request path is joined onto. Always ends with `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"[REDACTED]")
            .field("default_application_id", &self.default_application_id)
            .field("default_host_id", &self.default_host_id)
            .field("default_instance_id", &self.default_instance_id)
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Builder for [`ClientConfig`].
pub struct ClientConfigBuilder {
    api_key: String,
    default_application_id: Option<String>,
    default_host_id: Option<String>,
    default_instance_id: Option<String>,
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl ClientConfigBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            default_application_id: None,
            default_host_id: None,
            default_instance_id: None,
            base_url: API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("newrelic-rs/{}", crate::VERSION),
        }
    }

    #[must_use]
    pub fn default_application_id(mut self, id: impl Into<String>) -> Self {
        self.default_application_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn default_host_id(mut self, id: impl Into<String>) -> Self {
        self.default_host_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn default_instance_id(mut self, id: impl Into<String>) -> Self {
        self.default_instance_id = Some(id.into());
        self
    }

    /// Override the API endpoint (regional endpoints, test servers).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<ClientConfig> {
        let api_key = self.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(Error::Configuration("API key is required".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Configuration(
                "timeout must be greater than zero".to_string(),
            ));
        }
        let base_url = parse_base_url(&self.base_url)?;
        Ok(ClientConfig {
            api_key: SecretString::from(api_key),
            default_application_id: non_empty(self.default_application_id),
            default_host_id: non_empty(self.default_host_id),
            default_instance_id: non_empty(self.default_instance_id),
            base_url,
            timeout: self.timeout,
            user_agent: self.user_agent,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    // Url::join drops the last segment unless the base ends with a slash.
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    let url = Url::parse(&normalized)
        .map_err(|e| Error::Configuration(format!("invalid base URL {:?}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Configuration(format!(
            "unsupported base URL scheme: {}",
            other
        ))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_with_defaults() {
        let config = ClientConfig::builder("abc123").build().unwrap();
        assert_eq!(config.api_key(), "abc123");
        assert_eq!(config.base_url().as_str(), API_BASE);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.user_agent().starts_with("newrelic-rs/"));
        assert!(config.default_application_id().is_none());
    }

    #[test]
    fn empty_api_key_is_rejected() {
        for key in ["", "   "] {
            let err = ClientConfig::builder(key).build().unwrap_err();
            assert!(matches!(err, Error::Configuration(_)));
        }
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ClientConfig::builder("k")
            .timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = ClientConfig::builder("k")
            .base_url("http://127.0.0.1:8080/v2")
            .build()
            .unwrap();
        assert_eq!(config.base_url().as_str(), "http://127.0.0.1:8080/v2/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ClientConfig::builder("k")
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = ClientConfig::builder("k")
            .base_url("ftp://example.com/")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn blank_default_ids_are_dropped() {
        let config = ClientConfig::builder("k")
            .default_application_id("  ")
            .default_host_id("42")
            .build()
            .unwrap();
        assert!(config.default_application_id().is_none());
        assert_eq!(config.default_host_id(), Some("42"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ClientConfig::builder("super-secret").build().unwrap();
        let dbg = format!("{:?}", config);
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("REDACTED"));
    }
}
