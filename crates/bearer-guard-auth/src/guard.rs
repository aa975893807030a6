//! Request-scoped authentication.
//!
//! A [`Guard`] lives for one request. It holds the request's token (if any),
//! resolves the user it names through a [`UserProvider`], and issues tokens
//! on login and refresh.
//!
//! # State
//!
//! ```text
//! Unauthenticated ──user()──▶ Authenticating ──▶ Authenticated
//!                                     │
//!                                     └────────▶ Rejected
//! ```
//!
//! `login` and `set_user` move straight to `Authenticated`.

use std::fmt;
use std::sync::Arc;

use bearer_guard_core::{Credentials, UserId};
use chrono::Utc;
use serde_json::Value;

use crate::error::{JwtError, Result};
use crate::extract::{TokenExtractor, TokenRequest};
use crate::payload::Payload;
use crate::token::{Token, TokenFactory};

/// Claim holding the token's expiry in unix seconds.
const EXP_CLAIM: &str = "exp";

/// Claim holding the authenticated user's identifier.
const USER_ID_CLAIM: &str = "user_id";

/// A user that can be named in a token.
pub trait Authenticatable {
    /// The identifier written to the `user_id` claim.
    fn auth_identifier(&self) -> UserId;
}

/// Looks users up by identifier or by credentials.
pub trait UserProvider: Send + Sync {
    /// The user type this provider returns.
    type User: Authenticatable + Clone + Send + Sync;

    /// Find a user by identifier.
    fn retrieve_by_id(&self, id: &UserId) -> Option<Self::User>;

    /// Find the user the credentials refer to, without checking the secret part.
    fn retrieve_by_credentials(&self, credentials: &Credentials) -> Option<Self::User>;

    /// Check the credentials against a user returned by `retrieve_by_credentials`.
    fn validate_credentials(&self, user: &Self::User, credentials: &Credentials) -> bool;
}

/// Authentication state of a [`Guard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// No user resolved yet.
    Unauthenticated,
    /// A token is being validated.
    Authenticating,
    /// A user is cached for this request.
    Authenticated,
    /// The token was missing, invalid, or named no known user.
    Rejected,
}

/// Ties a request's token to a user.
pub struct Guard<P: UserProvider> {
    provider: Arc<P>,
    factory: TokenFactory,
    token: Option<Token>,
    user: Option<P::User>,
    last_attempted: Option<P::User>,
    state: GuardState,
}

impl<P: UserProvider> Guard<P> {
    /// Create a guard with no request token.
    #[must_use]
    pub fn new(provider: Arc<P>, factory: TokenFactory) -> Self {
        Self {
            provider,
            factory,
            token: None,
            user: None,
            last_attempted: None,
            state: GuardState::Unauthenticated,
        }
    }

    /// Create a guard for a request, extracting its token.
    #[must_use]
    pub fn from_request(
        provider: Arc<P>,
        factory: TokenFactory,
        extractor: &dyn TokenExtractor,
        request: &dyn TokenRequest,
    ) -> Self {
        let token = extractor.extract(request).map(|raw| factory.token_from(raw));
        let mut guard = Self::new(provider, factory);
        guard.token = token;
        guard
    }

    /// Set the request token, returning `self`.
    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    /// The request token.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::NoToken` if the request carried none.
    pub fn token(&self) -> Result<&Token> {
        self.token.as_ref().ok_or(JwtError::NoToken)
    }

    /// Current authentication state.
    #[must_use]
    pub const fn state(&self) -> GuardState {
        self.state
    }

    /// The user found by the last `validate` or `attempt` call.
    #[must_use]
    pub const fn last_attempted(&self) -> Option<&P::User> {
        self.last_attempted.as_ref()
    }

    /// The authenticated user, resolved from the token on first call.
    ///
    /// A missing or invalid token, a token without a usable `user_id`, and
    /// an unknown user all answer `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::NoSecret` if no secret is configured.
    pub fn user(&mut self) -> Result<Option<&P::User>> {
        if self.user.is_none() {
            self.state = GuardState::Authenticating;
            match self.lookup() {
                Ok(Some(user)) => {
                    self.user = Some(user);
                    self.state = GuardState::Authenticated;
                }
                Ok(None) => self.state = GuardState::Rejected,
                Err(err) => {
                    self.state = GuardState::Rejected;
                    return Err(err);
                }
            }
            tracing::debug!(state = ?self.state, "Resolved request user");
        }
        Ok(self.user.as_ref())
    }

    fn lookup(&self) -> Result<Option<P::User>> {
        let Some(token) = self.token.as_ref() else {
            return Ok(None);
        };

        match token.validate() {
            Ok(true) => {}
            Ok(false) | Err(JwtError::NoToken) => return Ok(None),
            Err(err) => return Err(err),
        }

        let claim = match token.query(USER_ID_CLAIM) {
            Ok(Some(claim)) => claim,
            Ok(None) | Err(JwtError::Verification(_)) => return Ok(None),
            Err(err) => return Err(err),
        };

        let Ok(id) = UserId::from_claim(&claim) else {
            tracing::debug!("Token user_id claim is not an identifier");
            return Ok(None);
        };
        Ok(self.provider.retrieve_by_id(&id))
    }

    /// Whether a user is authenticated.
    ///
    /// # Errors
    ///
    /// See [`user`](Self::user).
    pub fn check(&mut self) -> Result<bool> {
        Ok(self.user()?.is_some())
    }

    /// The authenticated user's identifier.
    ///
    /// # Errors
    ///
    /// See [`user`](Self::user).
    pub fn id(&mut self) -> Result<Option<UserId>> {
        Ok(self.user()?.map(Authenticatable::auth_identifier))
    }

    /// Cache `user` as the authenticated user.
    pub fn set_user(&mut self, user: P::User) -> &mut Self {
        self.user = Some(user);
        self.state = GuardState::Authenticated;
        self
    }

    /// Check credentials without logging in.
    pub fn validate(&mut self, credentials: &Credentials) -> bool {
        self.last_attempted = self.provider.retrieve_by_credentials(credentials);
        self.last_attempted
            .as_ref()
            .is_some_and(|user| self.provider.validate_credentials(user, credentials))
    }

    /// Log in with credentials.
    ///
    /// Returns the new token, or `Ok(None)` if the credentials do not match a user.
    ///
    /// # Errors
    ///
    /// Returns an error only if a token cannot be issued.
    pub fn attempt(&mut self, credentials: &Credentials) -> Result<Option<String>> {
        if !self.validate(credentials) {
            tracing::debug!("Login attempt rejected");
            return Ok(None);
        }
        match self.last_attempted.clone() {
            Some(user) => self.login(user).map(Some),
            None => Ok(None),
        }
    }

    /// Authenticate `user` and issue a token expiring one refresh window from now.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::NoSecret` if no secret is configured, or
    /// `JwtError::Verification` if the token cannot be signed.
    pub fn login(&mut self, user: P::User) -> Result<String> {
        let exp = Utc::now()
            .timestamp()
            .saturating_add(self.factory.config().refresh_window());
        let payload = Payload::new()
            .with(EXP_CLAIM, exp)
            .with(USER_ID_CLAIM, user.auth_identifier().to_claim());

        let token = self.factory.token().create_token(&payload)?.into_string()?;
        self.set_user(user);
        Ok(token)
    }

    /// Reissue `token` for the same user with `exp` extended by one refresh window.
    ///
    /// The new expiry is the old `exp` plus the window, not now plus the window.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Verification` if `token` does not decode, and
    /// `JwtError::MissingClaim` if it has no integer `exp` or no `user_id`.
    pub fn refresh(&self, token: &Token) -> Result<String> {
        let payload = token.payload()?;
        let exp = payload
            .get(EXP_CLAIM)
            .and_then(Value::as_i64)
            .ok_or(JwtError::MissingClaim(EXP_CLAIM))?;
        let user_id = payload
            .get(USER_ID_CLAIM)
            .cloned()
            .ok_or(JwtError::MissingClaim(USER_ID_CLAIM))?;

        let refreshed = Payload::new()
            .with(EXP_CLAIM, exp.saturating_add(self.factory.config().refresh_window()))
            .with(USER_ID_CLAIM, user_id);
        token.create_token(&refreshed)?.into_string()
    }

    /// Validate the request token, refresh it and pass the new token to `next`.
    ///
    /// `next` is never called when an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::NoToken` if the request carried no token,
    /// `JwtError::Unauthorized` if it does not validate, and the errors of
    /// [`refresh`](Self::refresh).
    pub fn handle<T>(&mut self, next: impl FnOnce(String) -> T) -> Result<T> {
        let token = match self.token.as_ref() {
            Some(token) => token,
            None => {
                self.state = GuardState::Rejected;
                return Err(JwtError::NoToken);
            }
        };

        if !token.validate()? {
            self.state = GuardState::Rejected;
            tracing::warn!("Rejected unauthorized request");
            return Err(JwtError::Unauthorized);
        }

        let refreshed = self.refresh(token)?;
        Ok(next(refreshed))
    }
}

impl<P: UserProvider> fmt::Debug for Guard<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("state", &self.state)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::codec::MockCodec;
    use crate::config::JwtConfig;
    use crate::extract::{BearerExtractor, StaticRequest};
    use serde_json::json;

    const SECRET: &str = "secret_123";

    #[derive(Debug, Clone, PartialEq)]
    struct TestUser {
        id: u64,
        email: String,
        password: String,
    }

    impl Authenticatable for TestUser {
        fn auth_identifier(&self) -> UserId {
            UserId::from(self.id)
        }
    }

    struct TestProvider {
        users: Vec<TestUser>,
    }

    impl UserProvider for TestProvider {
        type User = TestUser;

        fn retrieve_by_id(&self, id: &UserId) -> Option<TestUser> {
            self.users
                .iter()
                .find(|u| u.auth_identifier() == *id)
                .cloned()
        }

        fn retrieve_by_credentials(&self, credentials: &Credentials) -> Option<TestUser> {
            let email = credentials.get("email")?;
            self.users.iter().find(|u| &u.email == email).cloned()
        }

        fn validate_credentials(&self, user: &TestUser, credentials: &Credentials) -> bool {
            credentials.get("password") == Some(&user.password)
        }
    }

    fn provider() -> Arc<TestProvider> {
        Arc::new(TestProvider {
            users: vec![TestUser {
                id: 7,
                email: "ada@example.com".to_string(),
                password: "hunter2".to_string(),
            }],
        })
    }

    fn config() -> Arc<JwtConfig> {
        Arc::new(JwtConfig {
            secret: Some(SECRET.to_string()),
            ..JwtConfig::default()
        })
    }

    fn factory() -> TokenFactory {
        TokenFactory::from_config(config())
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials::from([
            ("email".to_string(), email.to_string()),
            ("password".to_string(), password.to_string()),
        ])
    }

    fn token_for(factory: &TokenFactory, payload: serde_json::Value) -> Token {
        factory
            .token()
            .create_token(&Payload::try_from(payload).unwrap())
            .unwrap()
    }

    #[test]
    fn user_resolves_from_valid_token() {
        let factory = factory();
        let exp = Utc::now().timestamp() + 60;
        let token = token_for(&factory, json!({"exp": exp, "user_id": 7}));

        let mut guard = Guard::new(provider(), factory).with_token(token);
        assert_eq!(guard.state(), GuardState::Unauthenticated);

        let user = guard.user().unwrap().cloned().unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(guard.state(), GuardState::Authenticated);
        assert!(guard.check().unwrap());
        assert_eq!(guard.id().unwrap(), Some(UserId::from(7_u64)));
    }

    #[test]
    fn user_accepts_string_user_id() {
        let factory = factory();
        let exp = Utc::now().timestamp() + 60;
        let token = token_for(&factory, json!({"exp": exp, "user_id": "7"}));

        let mut guard = Guard::new(provider(), factory).with_token(token);
        assert!(guard.check().unwrap());
    }

    #[test]
    fn user_is_cached() {
        let codec = Arc::new(MockCodec::new().with_token(
            "abc",
            SECRET,
            "HS256",
            Payload::new().with("user_id", 7),
        ));
        let factory = TokenFactory::new(codec.clone(), config());
        let mut guard =
            Guard::new(provider(), factory.clone()).with_token(factory.token_from("abc"));

        assert!(guard.user().unwrap().is_some());

        // Once cached, the token is no longer consulted.
        codec.insert("abc", "another secret", "HS256", Payload::new());
        assert!(guard.user().unwrap().is_some());
    }

    #[test]
    fn expired_token_has_no_user() {
        let factory = factory();
        let exp = Utc::now().timestamp() - 30;
        let token = token_for(&factory, json!({"exp": exp, "user_id": 7}));

        let mut guard = Guard::new(provider(), factory).with_token(token);
        assert!(guard.user().unwrap().is_none());
        assert_eq!(guard.state(), GuardState::Rejected);
    }

    #[test]
    fn unknown_user_has_no_user() {
        let factory = factory();
        let token = token_for(&factory, json!({"user_id": 99}));

        let mut guard = Guard::new(provider(), factory).with_token(token);
        assert!(!guard.check().unwrap());
        assert_eq!(guard.state(), GuardState::Rejected);
    }

    #[test]
    fn token_without_user_id_has_no_user() {
        let factory = factory();
        let token = token_for(&factory, json!({"foo": "bar"}));

        let mut guard = Guard::new(provider(), factory).with_token(token);
        assert!(guard.user().unwrap().is_none());
    }

    #[test]
    fn missing_token_has_no_user() {
        let mut guard = Guard::new(provider(), factory());
        assert!(guard.user().unwrap().is_none());
        assert_eq!(guard.state(), GuardState::Rejected);
        assert!(matches!(guard.token(), Err(JwtError::NoToken)));
    }

    #[test]
    fn missing_secret_is_an_error() {
        let factory = TokenFactory::from_config(Arc::new(JwtConfig::default()));
        let token = factory.token_from("abc");

        let mut guard = Guard::new(provider(), factory).with_token(token);
        assert!(matches!(guard.user(), Err(JwtError::NoSecret)));
    }

    #[test]
    fn from_request_extracts_token() {
        let factory = factory();
        let token = token_for(&factory, json!({"user_id": 7})).into_string().unwrap();
        let request =
            StaticRequest::default().with_header("Authorization", &format!("Bearer {token}"));

        let mut guard = Guard::from_request(
            provider(),
            factory,
            &BearerExtractor::default(),
            &request,
        );
        assert_eq!(guard.token().unwrap().token().unwrap(), token);
        assert!(guard.check().unwrap());
    }

    #[test]
    fn attempt_with_valid_credentials_logs_in() {
        let factory = factory();
        let mut guard = Guard::new(provider(), factory.clone());

        let raw = guard
            .attempt(&credentials("ada@example.com", "hunter2"))
            .unwrap()
            .unwrap();

        assert_eq!(guard.state(), GuardState::Authenticated);
        assert_eq!(guard.last_attempted().map(|u| u.id), Some(7));

        let issued = factory.token_from(raw);
        assert!(issued.validate().unwrap());
        assert_eq!(issued.query("user_id").unwrap(), Some(json!(7)));

        let exp = issued.query("exp").unwrap().and_then(|v| v.as_i64()).unwrap();
        let expected = Utc::now().timestamp() + 600;
        assert!((expected - 5..=expected).contains(&exp));
    }

    #[test]
    fn attempt_with_wrong_password_fails_softly() {
        let mut guard = Guard::new(provider(), factory());

        let result = guard.attempt(&credentials("ada@example.com", "wrong")).unwrap();

        assert!(result.is_none());
        assert_eq!(guard.last_attempted().map(|u| u.id), Some(7));
        assert_eq!(guard.state(), GuardState::Unauthenticated);
    }

    #[test]
    fn attempt_with_unknown_user_fails_softly() {
        let mut guard = Guard::new(provider(), factory());

        assert!(guard
            .attempt(&credentials("nobody@example.com", "hunter2"))
            .unwrap()
            .is_none());
        assert!(guard.last_attempted().is_none());
    }

    #[test]
    fn validate_does_not_log_in() {
        let mut guard = Guard::new(provider(), factory());

        assert!(guard.validate(&credentials("ada@example.com", "hunter2")));
        assert_eq!(guard.state(), GuardState::Unauthenticated);
    }

    #[test]
    fn refresh_extends_original_expiry() {
        let factory = factory();
        let exp = Utc::now().timestamp() + 30;
        let token = token_for(&factory, json!({"exp": exp, "user_id": 7, "role": "admin"}));
        let guard = Guard::new(provider(), factory.clone());

        let refreshed = factory.token_from(guard.refresh(&token).unwrap());

        assert_eq!(refreshed.query("exp").unwrap(), Some(json!(exp + 600)));
        assert_eq!(refreshed.query("user_id").unwrap(), Some(json!(7)));
        assert_eq!(refreshed.query("role").unwrap(), None);
    }

    #[test]
    fn refresh_keeps_explicit_secret() {
        let factory = factory();
        let mut token = factory.token();
        token.set_secret("per-token secret");
        let payload = Payload::new()
            .with("exp", Utc::now().timestamp() + 30)
            .with("user_id", 7);
        let token = token.create_token(&payload).unwrap();

        let guard = Guard::new(provider(), factory.clone());
        let mut refreshed = factory.token_from(guard.refresh(&token).unwrap());

        assert!(!refreshed.validate().unwrap());
        refreshed.set_secret("per-token secret");
        assert!(refreshed.validate().unwrap());
    }

    #[test]
    fn refresh_requires_exp() {
        let factory = factory();
        let token = token_for(&factory, json!({"user_id": 7}));
        let guard = Guard::new(provider(), factory);

        assert!(matches!(
            guard.refresh(&token),
            Err(JwtError::MissingClaim("exp"))
        ));
    }

    #[test]
    fn handle_refreshes_and_forwards() {
        let factory = factory();
        let exp = Utc::now().timestamp() + 30;
        let token = token_for(&factory, json!({"exp": exp, "user_id": 7}));
        let mut guard = Guard::new(provider(), factory.clone()).with_token(token);

        let forwarded = guard.handle(|refreshed| refreshed).unwrap();

        let refreshed = factory.token_from(forwarded);
        assert_eq!(refreshed.query("exp").unwrap(), Some(json!(exp + 600)));
    }

    #[test]
    fn handle_rejects_invalid_token() {
        let called = Cell::new(false);
        let factory = factory();
        let mut guard =
            Guard::new(provider(), factory.clone()).with_token(factory.token_from("not.a.token"));

        let result = guard.handle(|_| called.set(true));

        assert!(matches!(result, Err(JwtError::Unauthorized)));
        assert_eq!(guard.state(), GuardState::Rejected);
        assert!(!called.get());
    }

    #[test]
    fn handle_requires_token() {
        let mut guard = Guard::new(provider(), factory());
        assert!(matches!(guard.handle(|_| ()), Err(JwtError::NoToken)));
    }
}
