//! Login and current-user endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Serialize;

use bearer_guard_auth::{Authenticatable, UserProvider};
use bearer_guard_core::Credentials;

use crate::error::ApiError;
use crate::state::GatewayState;

/// Token issued on login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The signed token.
    pub token: String,
    /// Always `Bearer`.
    pub token_type: &'static str,
    /// Seconds until the token expires.
    pub expires_in: u64,
}

/// Exchange credentials for a token.
///
/// ```text
/// POST /v1/auth/login
/// {"email": "ada@example.com", "password": "..."}
///
/// Response: 200 OK
/// {"token": "...", "token_type": "Bearer", "expires_in": 600}
/// ```
///
/// # Errors
///
/// Returns 401 for unknown users or wrong passwords, and 500 if no token can be issued.
pub async fn login<P>(
    State(state): State<Arc<GatewayState<P>>>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError>
where
    P: UserProvider + 'static,
{
    let mut guard = state.guard();
    let token = guard
        .attempt(&credentials)
        .map_err(|err| state.api_error(&err))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials.".to_string()))?;

    tracing::info!(
        user_id = ?guard.last_attempted().map(Authenticatable::auth_identifier),
        "User logged in"
    );

    let response = LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt().refresh_window_seconds,
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Return the user named by the request token.
///
/// Mounted behind the refreshing guard, which attaches the user.
///
/// # Errors
///
/// Returns 401 if the token names no known user.
pub async fn me<U>(user: Option<Extension<U>>) -> Result<Json<U>, ApiError>
where
    U: Serialize + Clone + Send + Sync + 'static,
{
    user.map(|Extension(user)| Json(user))
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized.".to_string()))
}
