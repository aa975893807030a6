//! HTTP gateway for bearer-guard.
//!
//! This crate puts the token layer in front of an axum router:
//!
//! - [`HttpRequest`] adapts axum requests to the token extractor
//! - [`middleware::require_token`] rejects requests without a valid token
//! - [`middleware::guard_refresh`] validates, refreshes and attaches the user
//! - [`ApiError`] maps token errors to JSON responses
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bearer_guard_auth::{JwtConfig, TokenFactory};
//! use bearer_guard_gateway::{create_router, GatewayConfig, GatewayState, InMemoryUserProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let users = Arc::new(InMemoryUserProvider::new());
//! users.register("ada@example.com", "hunter2");
//!
//! let tokens = TokenFactory::from_config(Arc::new(JwtConfig::from_env()));
//! let state = GatewayState::new(users, tokens, GatewayConfig::default());
//!
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod routes;
pub mod state;
pub mod users;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use request::HttpRequest;
pub use routes::create_router;
pub use state::GatewayState;
pub use users::{InMemoryUserProvider, User};
