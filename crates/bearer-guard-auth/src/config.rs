//! Token configuration.
//!
//! [`JwtConfig`] is an immutable snapshot, built once at process start and
//! shared by `Arc` with every token, guard and middleware. Nothing in this
//! crate reads the environment after construction.

use std::fmt;

use serde::Deserialize;

/// Algorithm used when neither the token nor the configuration names one.
pub const DEFAULT_ALGORITHM: &str = "HS256";

/// Configuration for token operations.
#[derive(Clone, Deserialize)]
pub struct JwtConfig {
    /// Process-wide signing secret (`JWT_SECRET`).
    #[serde(default)]
    pub secret: Option<String>,

    /// Process-wide algorithm name (`JWT_ALGO`).
    #[serde(default)]
    pub algorithm: Option<String>,

    /// Clock-skew leeway in seconds for `exp`/`nbf` checks (`JWT_LEEWAY`).
    #[serde(default)]
    pub leeway_seconds: u64,

    /// Seconds added to `exp` on login and on refresh (`JWT_REFRESH_WINDOW`).
    #[serde(default = "JwtConfig::default_refresh_window")]
    pub refresh_window_seconds: u64,

    /// Header searched for `Bearer <token>` (`JWT_HEADER`).
    #[serde(default = "JwtConfig::default_header_name")]
    pub header_name: String,

    /// Request field searched when the header has no token (`JWT_INPUT`).
    #[serde(default = "JwtConfig::default_input_name")]
    pub input_name: String,

    /// Messages returned to clients for each failure category.
    #[serde(default)]
    pub messages: ErrorMessages,
}

impl JwtConfig {
    const fn default_refresh_window() -> u64 {
        600 // 10 minutes
    }

    fn default_header_name() -> String {
        "Authorization".to_string()
    }

    fn default_input_name() -> String {
        "token".to_string()
    }

    /// Build a configuration from the process environment.
    ///
    /// Unset or empty variables fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Keys are the environment variable names documented on each field.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            secret: get("JWT_SECRET"),
            algorithm: get("JWT_ALGO"),
            leeway_seconds: get("JWT_LEEWAY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.leeway_seconds),
            refresh_window_seconds: get("JWT_REFRESH_WINDOW")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.refresh_window_seconds),
            header_name: get("JWT_HEADER").unwrap_or(defaults.header_name),
            input_name: get("JWT_INPUT").unwrap_or(defaults.input_name),
            messages: ErrorMessages {
                error: get("JWT_MESSAGE_ERROR").unwrap_or(defaults.messages.error),
                invalid_token: get("JWT_MESSAGE_INVALID").unwrap_or(defaults.messages.invalid_token),
                no_token: get("JWT_MESSAGE_NOTOKEN").unwrap_or(defaults.messages.no_token),
                no_secret: get("JWT_MESSAGE_NOSECRET").unwrap_or(defaults.messages.no_secret),
            },
        }
    }

    /// The refresh window as a signed second count for `exp` arithmetic.
    #[must_use]
    pub fn refresh_window(&self) -> i64 {
        i64::try_from(self.refresh_window_seconds).unwrap_or(i64::MAX)
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            algorithm: None,
            leeway_seconds: 0,
            refresh_window_seconds: Self::default_refresh_window(),
            header_name: Self::default_header_name(),
            input_name: Self::default_input_name(),
            messages: ErrorMessages::default(),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("JwtConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("algorithm", &self.algorithm)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("refresh_window_seconds", &self.refresh_window_seconds)
            .field("header_name", &self.header_name)
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

/// Client-facing messages for the four failure categories.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ErrorMessages {
    /// Generic failure (`JWT_MESSAGE_ERROR`).
    pub error: String,
    /// Token failed verification (`JWT_MESSAGE_INVALID`).
    pub invalid_token: String,
    /// No token in the request (`JWT_MESSAGE_NOTOKEN`).
    pub no_token: String,
    /// No secret configured (`JWT_MESSAGE_NOSECRET`).
    pub no_secret: String,
}

impl Default for ErrorMessages {
    fn default() -> Self {
        Self {
            error: "Something went wrong while validating the token.".to_string(),
            invalid_token: "Token is not valid.".to_string(),
            no_token: "Token is required.".to_string(),
            no_secret: "No JWT secret defined.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config() {
        let config = JwtConfig::default();
        assert!(config.secret.is_none());
        assert!(config.algorithm.is_none());
        assert_eq!(config.leeway_seconds, 0);
        assert_eq!(config.refresh_window_seconds, 600);
        assert_eq!(config.header_name, "Authorization");
        assert_eq!(config.input_name, "token");
        assert_eq!(config.messages.invalid_token, "Token is not valid.");
    }

    #[test]
    fn config_from_lookup() {
        let config = JwtConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "secret_123"),
            ("JWT_ALGO", "HS512"),
            ("JWT_LEEWAY", "5"),
            ("JWT_REFRESH_WINDOW", "60"),
            ("JWT_HEADER", "X-Auth"),
            ("JWT_INPUT", "access_token"),
            ("JWT_MESSAGE_NOTOKEN", "Bring a token."),
        ]));

        assert_eq!(config.secret.as_deref(), Some("secret_123"));
        assert_eq!(config.algorithm.as_deref(), Some("HS512"));
        assert_eq!(config.leeway_seconds, 5);
        assert_eq!(config.refresh_window_seconds, 60);
        assert_eq!(config.header_name, "X-Auth");
        assert_eq!(config.input_name, "access_token");
        assert_eq!(config.messages.no_token, "Bring a token.");
        assert_eq!(config.messages.no_secret, "No JWT secret defined.");
    }

    #[test]
    fn empty_and_unparsable_values_fall_back() {
        let config = JwtConfig::from_lookup(lookup(&[
            ("JWT_SECRET", ""),
            ("JWT_ALGO", "  "),
            ("JWT_LEEWAY", "soon"),
        ]));

        assert!(config.secret.is_none());
        assert!(config.algorithm.is_none());
        assert_eq!(config.leeway_seconds, 0);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: JwtConfig =
            serde_json::from_str(r#"{"secret": "s", "messages": {"no_token": "missing"}}"#)
                .unwrap();
        assert_eq!(config.secret.as_deref(), Some("s"));
        assert_eq!(config.refresh_window_seconds, 600);
        assert_eq!(config.messages.no_token, "missing");
        assert_eq!(config.messages.error, ErrorMessages::default().error);
    }

    #[test]
    fn debug_redacts_secret() {
        let config = JwtConfig {
            secret: Some("top-secret".to_string()),
            ..JwtConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("top-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
