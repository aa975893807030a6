//! Token extraction from requests.
//!
//! Both [`TokenMiddleware`](crate::TokenMiddleware) and [`Guard`](crate::Guard)
//! find the candidate token through a [`TokenExtractor`], so the lookup rules
//! live in one place. Frameworks plug in by implementing [`TokenRequest`].

use std::sync::Arc;

use crate::config::JwtConfig;

/// Read access to the parts of a request a token can travel in.
pub trait TokenRequest {
    /// Value of the header `name`, if present and valid UTF-8.
    fn header(&self, name: &str) -> Option<&str>;

    /// Value of the request field `name` (query string or form input).
    fn input(&self, name: &str) -> Option<&str>;
}

/// Finds a candidate token in a request.
pub trait TokenExtractor: Send + Sync {
    /// Extract the raw token, or `None` if the request carries none.
    fn extract(&self, request: &dyn TokenRequest) -> Option<String>;
}

/// An extractor shared between the middleware and guards.
pub type SharedExtractor = Arc<dyn TokenExtractor>;

const BEARER_PREFIX: &str = "Bearer ";

/// Looks for `Bearer <token>` in a header, then for a named input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerExtractor {
    header_name: String,
    input_name: String,
}

impl BearerExtractor {
    /// Create an extractor for the given header and input field names.
    #[must_use]
    pub fn new(header_name: impl Into<String>, input_name: impl Into<String>) -> Self {
        Self {
            header_name: header_name.into(),
            input_name: input_name.into(),
        }
    }

    /// Create an extractor using the configured names.
    #[must_use]
    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(config.header_name.clone(), config.input_name.clone())
    }

    /// The header searched first.
    #[must_use]
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// The input field searched when the header has no token.
    #[must_use]
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Parse `Bearer <token>`, returning the first word after the prefix.
    ///
    /// The prefix is matched exactly, including case and the single space.
    #[must_use]
    pub fn parse_bearer(value: &str) -> Option<&str> {
        value
            .strip_prefix(BEARER_PREFIX)?
            .split_whitespace()
            .next()
    }
}

impl Default for BearerExtractor {
    fn default() -> Self {
        Self::from_config(&JwtConfig::default())
    }
}

impl TokenExtractor for BearerExtractor {
    fn extract(&self, request: &dyn TokenRequest) -> Option<String> {
        if let Some(token) = request
            .header(&self.header_name)
            .and_then(Self::parse_bearer)
        {
            return Some(token.to_string());
        }

        request
            .input(&self.input_name)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToString::to_string)
    }
}

/// An in-memory request for tests and non-HTTP callers.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone, Default)]
pub struct StaticRequest {
    /// Headers, matched case-insensitively.
    pub headers: Vec<(String, String)>,
    /// Input fields, matched exactly.
    pub inputs: Vec<(String, String)>,
}

#[cfg(any(test, feature = "test-utils"))]
impl StaticRequest {
    /// Add a header, returning `self`.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Add an input field, returning `self`.
    #[must_use]
    pub fn with_input(mut self, name: &str, value: &str) -> Self {
        self.inputs.push((name.to_string(), value.to_string()));
        self
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl TokenRequest for StaticRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn input(&self, name: &str) -> Option<&str> {
        self.inputs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}
