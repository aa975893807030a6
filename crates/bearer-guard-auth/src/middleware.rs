//! Request interception.
//!
//! [`TokenMiddleware`] is framework-agnostic: it takes any [`TokenRequest`]
//! and a continuation. The HTTP layer wraps it and maps its errors to
//! responses; no response is built here.

use std::fmt;
use std::sync::Arc;

use crate::error::{JwtError, Result};
use crate::extract::{BearerExtractor, SharedExtractor, TokenRequest};
use crate::token::{Token, TokenFactory};

/// Rejects requests without a valid token before they reach `next`.
#[derive(Clone)]
pub struct TokenMiddleware {
    factory: TokenFactory,
    extractor: SharedExtractor,
}

impl TokenMiddleware {
    /// Create a middleware with an explicit extractor.
    #[must_use]
    pub fn new(factory: TokenFactory, extractor: SharedExtractor) -> Self {
        Self { factory, extractor }
    }

    /// Create a middleware using a [`BearerExtractor`] built from the factory's configuration.
    #[must_use]
    pub fn from_factory(factory: TokenFactory) -> Self {
        let extractor: SharedExtractor = Arc::new(BearerExtractor::from_config(factory.config()));
        Self::new(factory, extractor)
    }

    /// Build a token from the request.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::NoToken` if the request carries no token.
    pub fn extract_token(&self, request: &dyn TokenRequest) -> Result<Token> {
        self.extractor
            .extract(request)
            .map(|raw| self.factory.token_from(raw))
            .ok_or(JwtError::NoToken)
    }

    /// Validate the request's token, then call `next` with the request.
    ///
    /// `next` is never called when an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::NoToken` if the request carries no token,
    /// `JwtError::InvalidToken` if it fails verification, and
    /// `JwtError::NoSecret` if no secret is configured.
    pub fn handle<R, T>(&self, request: R, next: impl FnOnce(R) -> T) -> Result<T>
    where
        R: TokenRequest,
    {
        let token = self.extract_token(&request)?;
        if let Err(err) = token.validate_or_fail() {
            tracing::warn!(error = %err, "Rejected request token");
            return Err(err);
        }
        Ok(next(request))
    }
}

impl fmt::Debug for TokenMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenMiddleware")
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}
