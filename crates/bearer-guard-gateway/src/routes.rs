//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use bearer_guard_auth::UserProvider;

use crate::handlers::{auth, claims, health};
use crate::middleware::{guard_refresh, require_token};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `POST /v1/auth/login` - Exchange credentials for a token
///
/// ## Guarded (token refreshed on every response)
/// - `GET /v1/auth/me` - Current user
///
/// ## Token required
/// - `GET /v1/claims` - Decoded payload, or one claim with `?path=`
pub fn create_router<P>(state: GatewayState<P>) -> Router
where
    P: UserProvider + 'static,
    P::User: Serialize + 'static,
{
    // Extract config values before moving state
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let state = Arc::new(state);

    let guarded = Router::new()
        .route("/v1/auth/me", get(auth::me::<P::User>))
        .route_layer(from_fn_with_state(Arc::clone(&state), guard_refresh::<P>));

    let token_required = Router::new()
        .route("/v1/claims", get(claims::claims::<P>))
        .route_layer(from_fn_with_state(Arc::clone(&state), require_token::<P>));

    Router::new()
        // Public
        .route("/health", get(health::health))
        .route("/v1/auth/login", post(auth::login::<P>))
        .merge(guarded)
        .merge(token_required)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(timeout_layer(request_timeout))
        .with_state(state)
}

/// Answer 408 when a request takes longer than `timeout`.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
