//! Bearer token issuing, validation and request guarding.
//!
//! This crate provides the token layer of bearer-guard:
//!
//! - [`Codec`]: signs and verifies compact JWTs (default: [`JwtCodec`] over `jsonwebtoken`)
//! - [`Token`]: a value object owning the raw token plus secret/algorithm resolution
//! - [`TokenMiddleware`]: rejects requests that carry no token or an invalid one
//! - [`Guard`]: ties a token to a user identity, logs users in and refreshes tokens
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │  HTTP boundary   │────▶│  TokenExtractor  │  Authorization: Bearer <token>
//! │  (gateway)       │     │  (header/input)  │  or ?token=<token>
//! └────────┬─────────┘     └──────────────────┘
//!          │
//!   ┌──────┴───────────────┐
//!   ▼                      ▼
//! ┌──────────────────┐   ┌──────────────────┐
//! │ TokenMiddleware  │   │      Guard       │──▶ UserProvider
//! │ (validate/fail)  │   │ (user, refresh)  │
//! └────────┬─────────┘   └────────┬─────────┘
//!          └──────────┬───────────┘
//!                     ▼
//!            ┌──────────────────┐
//!            │      Token       │  secret / algorithm precedence
//!            └────────┬─────────┘
//!                     ▼
//!            ┌──────────────────┐
//!            │      Codec       │  encode / decode / validate
//!            └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bearer_guard_auth::{JwtConfig, Payload, TokenFactory};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = JwtConfig {
//!     secret: Some("secret_123".to_string()),
//!     ..JwtConfig::default()
//! };
//! let factory = TokenFactory::from_config(Arc::new(config));
//!
//! let payload = Payload::try_from(json!({"user_id": 7, "context": {"some": "data"}}))?;
//! let token = factory.token().create_token(&payload)?;
//!
//! assert!(token.validate()?);
//! assert_eq!(token.query("context.some")?, Some(json!("data")));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod config;
pub mod error;
pub mod extract;
pub mod guard;
pub mod middleware;
pub mod payload;
pub mod token;

pub use codec::{Codec, JwtCodec, SharedCodec};
pub use config::{ErrorMessages, JwtConfig, DEFAULT_ALGORITHM};
pub use error::{CodecError, JwtError, Result};
pub use extract::{BearerExtractor, SharedExtractor, TokenExtractor, TokenRequest};
pub use guard::{Authenticatable, Guard, GuardState, UserProvider};
pub use middleware::TokenMiddleware;
pub use payload::{Payload, PayloadSource};
pub use token::{Overrides, Token, TokenFactory};

#[cfg(any(test, feature = "test-utils"))]
pub use codec::MockCodec;
#[cfg(any(test, feature = "test-utils"))]
pub use extract::StaticRequest;

// Re-export the identifier types that appear in this crate's API
pub use bearer_guard_core::{Credentials, UserId};
