//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use axum::http::header::{HeaderName, AUTHORIZATION};

use bearer_guard_auth::{
    BearerExtractor, Guard, JwtConfig, JwtError, SharedExtractor, TokenFactory, TokenMiddleware,
    TokenRequest, UserProvider,
};

use crate::config::GatewayConfig;
use crate::error::ApiError;

/// Shared application state for the gateway.
pub struct GatewayState<P>
where
    P: UserProvider,
{
    /// User lookups for login and for the guard.
    pub users: Arc<P>,
    /// Creates tokens bound to the codec and token configuration.
    pub tokens: TokenFactory,
    /// Finds the token in a request.
    pub extractor: SharedExtractor,
    /// Rejects requests without a valid token.
    pub middleware: TokenMiddleware,
    /// Gateway configuration.
    pub config: GatewayConfig,
    header_name: HeaderName,
}

impl<P> GatewayState<P>
where
    P: UserProvider,
{
    /// Create a new gateway state.
    ///
    /// The token header is taken from the factory's configuration; an
    /// unusable header name falls back to `Authorization`.
    #[must_use]
    pub fn new(users: Arc<P>, tokens: TokenFactory, config: GatewayConfig) -> Self {
        let header_name = HeaderName::try_from(tokens.config().header_name.as_str())
            .unwrap_or_else(|_| {
                tracing::warn!(
                    header = %tokens.config().header_name,
                    "Invalid token header name, using Authorization"
                );
                AUTHORIZATION
            });
        let extractor: SharedExtractor = Arc::new(BearerExtractor::new(
            header_name.as_str(),
            tokens.config().input_name.as_str(),
        ));
        let middleware = TokenMiddleware::new(tokens.clone(), Arc::clone(&extractor));

        Self {
            users,
            tokens,
            extractor,
            middleware,
            config,
            header_name,
        }
    }

    /// The token configuration.
    #[must_use]
    pub fn jwt(&self) -> &JwtConfig {
        self.tokens.config()
    }

    /// The header carrying `Bearer <token>`.
    #[must_use]
    pub const fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    /// Create a guard for one request.
    #[must_use]
    pub fn guard_for(&self, request: &dyn TokenRequest) -> Guard<P> {
        Guard::from_request(
            Arc::clone(&self.users),
            self.tokens.clone(),
            self.extractor.as_ref(),
            request,
        )
    }

    /// Create a guard with no request token.
    #[must_use]
    pub fn guard(&self) -> Guard<P> {
        Guard::new(Arc::clone(&self.users), self.tokens.clone())
    }

    /// Map a token error to an API error using the configured messages.
    #[must_use]
    pub fn api_error(&self, err: &JwtError) -> ApiError {
        ApiError::from_jwt(
            err,
            &self.jwt().messages,
            self.config.missing_token_status(),
        )
    }
}

impl<P> Clone for GatewayState<P>
where
    P: UserProvider,
{
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            tokens: self.tokens.clone(),
            extractor: Arc::clone(&self.extractor),
            middleware: self.middleware.clone(),
            config: self.config.clone(),
            header_name: self.header_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::InMemoryUserProvider;

    fn state(config: JwtConfig) -> GatewayState<InMemoryUserProvider> {
        GatewayState::new(
            Arc::new(InMemoryUserProvider::new()),
            TokenFactory::from_config(Arc::new(config)),
            GatewayConfig::default(),
        )
    }

    #[test]
    fn header_name_follows_token_config() {
        let state = state(JwtConfig {
            header_name: "X-Api-Token".to_string(),
            ..JwtConfig::default()
        });
        assert_eq!(state.header_name().as_str(), "x-api-token");
    }

    #[test]
    fn invalid_header_name_falls_back() {
        let state = state(JwtConfig {
            header_name: "not a header".to_string(),
            ..JwtConfig::default()
        });
        assert_eq!(state.header_name(), &AUTHORIZATION);
    }

    #[test]
    fn api_error_uses_messages() {
        let state = state(JwtConfig::default());
        let err = state.api_error(&JwtError::NoToken);
        assert_eq!(err.to_string(), "Token is required.");
        assert_eq!(err.status_code().as_u16(), 422);
    }
}
