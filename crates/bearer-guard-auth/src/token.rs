//! The token value object.
//!
//! A [`Token`] holds an optional raw token string plus an optional explicit
//! secret and algorithm. Secret and algorithm resolve with the precedence
//! explicit value > configuration > (algorithm only) [`DEFAULT_ALGORITHM`].
//!
//! Tokens are mutated in place through the setters. [`Token::create_token`]
//! never mutates its receiver: it returns a new token carrying the freshly
//! encoded raw value and the receiver's explicit secret and algorithm.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::codec::{JwtCodec, SharedCodec};
use crate::config::{JwtConfig, DEFAULT_ALGORITHM};
use crate::error::{JwtError, Result};
use crate::payload::{Payload, PayloadSource};

/// Per-call secret/algorithm overrides.
///
/// Empty strings count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides<'a> {
    /// Secret to use instead of the token's resolved secret.
    pub secret: Option<&'a str>,
    /// Algorithm to use instead of the token's resolved algorithm.
    pub algorithm: Option<&'a str>,
}

impl<'a> Overrides<'a> {
    /// Override only the secret.
    #[must_use]
    pub const fn secret(secret: &'a str) -> Self {
        Self {
            secret: Some(secret),
            algorithm: None,
        }
    }

    /// Override only the algorithm.
    #[must_use]
    pub const fn algorithm(algorithm: &'a str) -> Self {
        Self {
            secret: None,
            algorithm: Some(algorithm),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// A bearer token plus the key settings used to verify it.
pub struct Token {
    codec: SharedCodec,
    config: Arc<JwtConfig>,
    raw: Option<String>,
    secret: Option<String>,
    algorithm: Option<String>,
}

impl Token {
    /// Create an empty token.
    #[must_use]
    pub fn new(codec: SharedCodec, config: Arc<JwtConfig>) -> Self {
        Self {
            codec,
            config,
            raw: None,
            secret: None,
            algorithm: None,
        }
    }

    /// Get the raw token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::NoToken` if no token has been set.
    pub fn token(&self) -> Result<&str> {
        non_empty(self.raw.as_deref()).ok_or(JwtError::NoToken)
    }

    /// Set the raw token.
    pub fn set_token(&mut self, token: impl Into<String>) -> &mut Self {
        self.raw = Some(token.into());
        self
    }

    /// Set the raw token, consuming and returning `self`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set_token(token);
        self
    }

    /// Resolve the secret: explicit value, then configuration.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::NoSecret` if neither source has one.
    pub fn secret(&self) -> Result<&str> {
        non_empty(self.secret.as_deref())
            .or_else(|| non_empty(self.config.secret.as_deref()))
            .ok_or(JwtError::NoSecret)
    }

    /// Set an explicit secret.
    pub fn set_secret(&mut self, secret: impl Into<String>) -> &mut Self {
        self.secret = Some(secret.into());
        self
    }

    /// Resolve the algorithm: explicit value, then configuration, then `HS256`.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        non_empty(self.algorithm.as_deref())
            .or_else(|| non_empty(self.config.algorithm.as_deref()))
            .unwrap_or(DEFAULT_ALGORITHM)
    }

    /// Set an explicit algorithm.
    pub fn set_algorithm(&mut self, algorithm: impl Into<String>) -> &mut Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    fn resolve<'a>(&'a self, overrides: Overrides<'a>) -> Result<(&'a str, &'a str)> {
        let secret = match non_empty(overrides.secret) {
            Some(secret) => secret,
            None => self.secret()?,
        };
        let algorithm = non_empty(overrides.algorithm).unwrap_or_else(|| self.algorithm());
        Ok((secret, algorithm))
    }

    /// Check the token's signature and temporal claims.
    ///
    /// # Errors
    ///
    /// A token that fails verification answers `Ok(false)`. Errors are
    /// reserved for missing state: `JwtError::NoToken` or `JwtError::NoSecret`.
    pub fn validate(&self) -> Result<bool> {
        self.validate_with(Overrides::default())
    }

    /// [`validate`](Self::validate) with per-call overrides.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::NoToken` or `JwtError::NoSecret`.
    pub fn validate_with(&self, overrides: Overrides<'_>) -> Result<bool> {
        let token = self.token()?;
        let (secret, algorithm) = self.resolve(overrides)?;
        Ok(self.codec.validate(token, secret, algorithm))
    }

    /// Check the token, failing if it does not verify.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidToken` for a token that fails verification,
    /// and `JwtError::NoToken` or `JwtError::NoSecret` for missing state.
    pub fn validate_or_fail(&self) -> Result<()> {
        self.validate_or_fail_with(Overrides::default())
    }

    /// [`validate_or_fail`](Self::validate_or_fail) with per-call overrides.
    ///
    /// # Errors
    ///
    /// See [`validate_or_fail`](Self::validate_or_fail).
    pub fn validate_or_fail_with(&self, overrides: Overrides<'_>) -> Result<()> {
        if self.validate_with(overrides)? {
            Ok(())
        } else {
            Err(JwtError::InvalidToken)
        }
    }

    /// Decode the full payload. Nothing is cached; every call decodes.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Verification` if the token does not decode, plus
    /// the missing-state errors of [`validate`](Self::validate).
    pub fn payload(&self) -> Result<Payload> {
        self.payload_with(Overrides::default())
    }

    /// [`payload`](Self::payload) with per-call overrides.
    ///
    /// # Errors
    ///
    /// See [`payload`](Self::payload).
    pub fn payload_with(&self, overrides: Overrides<'_>) -> Result<Payload> {
        let token = self.token()?;
        let (secret, algorithm) = self.resolve(overrides)?;
        Ok(self.codec.decode(token, secret, algorithm)?)
    }

    /// Decode the payload and resolve `path` in it.
    ///
    /// `path` is a top-level key or a dot path such as `context.some`.
    /// Returns `Ok(None)` if neither resolves.
    ///
    /// # Errors
    ///
    /// See [`payload`](Self::payload).
    pub fn query(&self, path: &str) -> Result<Option<Value>> {
        self.query_with(path, Overrides::default())
    }

    /// [`query`](Self::query) with per-call overrides.
    ///
    /// # Errors
    ///
    /// See [`payload`](Self::payload).
    pub fn query_with(&self, path: &str, overrides: Overrides<'_>) -> Result<Option<Value>> {
        Ok(self.payload_with(overrides)?.query(path).cloned())
    }

    /// Encode a new token from `source`, leaving `self` unchanged.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::NoSecret` if no secret resolves, or
    /// `JwtError::Verification` if the codec cannot sign.
    pub fn create_token(&self, source: &impl PayloadSource) -> Result<Token> {
        self.create_token_with(source, Overrides::default())
    }

    /// [`create_token`](Self::create_token) with per-call overrides.
    ///
    /// # Errors
    ///
    /// See [`create_token`](Self::create_token).
    pub fn create_token_with(
        &self,
        source: &impl PayloadSource,
        overrides: Overrides<'_>,
    ) -> Result<Token> {
        let payload = source.to_payload();
        let (secret, algorithm) = self.resolve(overrides)?;
        let raw = self.codec.encode(&payload, secret, algorithm)?;

        Ok(Token {
            codec: Arc::clone(&self.codec),
            config: Arc::clone(&self.config),
            raw: Some(raw),
            secret: self.secret.clone(),
            algorithm: self.algorithm.clone(),
        })
    }

    /// Consume the token and return its raw string.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::NoToken` if no token has been set.
    pub fn into_string(self) -> Result<String> {
        self.token()?;
        self.raw.ok_or(JwtError::NoToken)
    }
}

impl TryFrom<&Token> for String {
    type Error = JwtError;

    fn try_from(token: &Token) -> Result<Self> {
        token.token().map(ToOwned::to_owned)
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let raw = self.token().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(raw)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material or the bearer credential
        f.debug_struct("Token")
            .field("has_token", &self.raw.is_some())
            .field("has_secret", &self.secret.is_some())
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

/// Builds tokens that share a codec and configuration.
#[derive(Clone)]
pub struct TokenFactory {
    codec: SharedCodec,
    config: Arc<JwtConfig>,
}

impl TokenFactory {
    /// Create a factory around an explicit codec.
    #[must_use]
    pub fn new(codec: SharedCodec, config: Arc<JwtConfig>) -> Self {
        Self { codec, config }
    }

    /// Create a factory using [`JwtCodec`] with the configured leeway.
    #[must_use]
    pub fn from_config(config: Arc<JwtConfig>) -> Self {
        let codec: SharedCodec = Arc::new(JwtCodec::from_config(&config));
        Self::new(codec, config)
    }

    /// An empty token.
    #[must_use]
    pub fn token(&self) -> Token {
        Token::new(Arc::clone(&self.codec), Arc::clone(&self.config))
    }

    /// A token carrying `raw`.
    #[must_use]
    pub fn token_from(&self, raw: impl Into<String>) -> Token {
        self.token().with_token(raw)
    }

    /// The shared configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<JwtConfig> {
        &self.config
    }

    /// The shared codec.
    #[must_use]
    pub fn codec(&self) -> &SharedCodec {
        &self.codec
    }
}

impl fmt::Debug for TokenFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
