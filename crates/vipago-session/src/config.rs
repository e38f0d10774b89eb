//! Session configuration.

use vipago_transport::PAYMENT_METHOD_CREATION_PATH;

use crate::error::ConfigError;

/// Production API base URL, used when none is configured.
pub const DEFAULT_API_URL: &str = "https://api.vipago.com";
/// Environment variable holding the API base URL.
pub const API_URL_VAR: &str = "VIPAGO_API_URL";
/// Environment variable that lifts the PCI-scope gate.
pub const UNSAFE_MODE_VAR: &str = "VIPAGO_UNSAFE_MODE";

/// Where the SDK is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// The end user's browser, where card data is entered.
    Browser,
    /// Any other process (servers, CLIs, workers).
    Native,
}

impl RuntimeEnvironment {
    /// Environment of the current build target.
    #[must_use]
    pub const fn detect() -> Self {
        if cfg!(target_arch = "wasm32") {
            Self::Browser
        } else {
            Self::Native
        }
    }

    /// Whether raw card data may be held in memory here without bringing
    /// the process into PCI scope.
    #[must_use]
    pub const fn is_card_entry_environment(self) -> bool {
        matches!(self, Self::Browser)
    }
}

/// Configuration for payment-method creation sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// API base URL, always `http://` or `https://`.
    api_url: String,
    /// Allow sessions outside a card-entry environment.
    pub unsafe_mode: bool,
    /// Environment the session runs in.
    pub environment: RuntimeEnvironment,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            unsafe_mode: false,
            environment: RuntimeEnvironment::detect(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns error if a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = match lookup(API_URL_VAR) {
            Some(value) => validate_api_url(value)?,
            None => {
                tracing::debug!("Assuming production API URL");
                DEFAULT_API_URL.to_string()
            }
        };
        let unsafe_mode = match lookup(UNSAFE_MODE_VAR) {
            Some(value) => parse_bool(UNSAFE_MODE_VAR, &value)?,
            None => false,
        };
        Ok(Self {
            api_url,
            unsafe_mode,
            environment: RuntimeEnvironment::detect(),
        })
    }

    /// Set the API base URL.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidUrl`] unless `api_url` is an absolute
    /// `http` or `https` URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Result<Self, ConfigError> {
        self.api_url = validate_api_url(api_url.into())?;
        Ok(self)
    }

    /// Set the unsafe-mode override.
    #[must_use]
    pub const fn with_unsafe_mode(mut self, unsafe_mode: bool) -> Self {
        self.unsafe_mode = unsafe_mode;
        self
    }

    /// Set the runtime environment.
    #[must_use]
    pub const fn with_environment(mut self, environment: RuntimeEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// API base URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Whether a session may hold raw card data under this configuration.
    #[must_use]
    pub const fn allows_card_data(&self) -> bool {
        self.unsafe_mode || self.environment.is_card_entry_environment()
    }

    /// WebSocket URL of the payment-method creation endpoint.
    #[must_use]
    pub fn websocket_url(&self) -> String {
        let base = self.api_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else {
            base.to_string()
        };
        format!("{base}{PAYMENT_METHOD_CREATION_PATH}")
    }
}

fn validate_api_url(value: String) -> Result<String, ConfigError> {
    let url = url::Url::parse(&value).map_err(|e| ConfigError::InvalidUrl {
        value: value.clone(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(value),
        scheme => Err(ConfigError::InvalidUrl {
            value,
            reason: format!("unsupported scheme `{scheme}`"),
        }),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(!config.unsafe_mode);
        assert_eq!(config.environment, RuntimeEnvironment::Native);
        assert!(!config.allows_card_data());
    }

    #[test]
    fn test_reads_variables() {
        let config = SessionConfig::from_lookup(lookup(&[
            ("VIPAGO_API_URL", "http://localhost:8080"),
            ("VIPAGO_UNSAFE_MODE", "TRUE"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert!(config.unsafe_mode);
        assert!(config.allows_card_data());
    }

    #[test]
    fn test_invalid_unsafe_mode() {
        let err = SessionConfig::from_lookup(lookup(&[("VIPAGO_UNSAFE_MODE", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { key: "VIPAGO_UNSAFE_MODE", .. }));
    }

    #[test]
    fn test_invalid_api_url() {
        let err = SessionConfig::from_lookup(lookup(&[("VIPAGO_API_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        let err = SessionConfig::from_lookup(lookup(&[("VIPAGO_API_URL", "ftp://api.vipago.com")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { reason, .. } if reason.contains("ftp")));
    }

    #[test]
    fn test_builder_validates_api_url() {
        let err = SessionConfig::default()
            .with_api_url("ws://localhost:3000")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { reason, .. } if reason.contains("ws")));
        assert!(SessionConfig::default().with_api_url("localhost:3000").is_err());
    }

    #[test]
    fn test_websocket_url() {
        let config = SessionConfig::default();
        assert_eq!(
            config.websocket_url(),
            "wss://api.vipago.com/api/v1/payment-methods/create"
        );
        let config = config.with_api_url("http://localhost:3000/").unwrap();
        assert_eq!(
            config.websocket_url(),
            "ws://localhost:3000/api/v1/payment-methods/create"
        );
    }

    #[test]
    fn test_browser_allows_card_data() {
        let config = SessionConfig::default().with_environment(RuntimeEnvironment::Browser);
        assert!(config.allows_card_data());
    }
}
