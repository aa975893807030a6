//! Token enforcement layers.
//!
//! - [`require_token`]: rejects requests without a valid token
//! - [`guard_refresh`]: rejects unauthorized requests and swaps the request
//!   token for a refreshed one, echoing it on the response
//!
//! Both are installed with `axum::middleware::from_fn_with_state`.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use bearer_guard_auth::UserProvider;

use crate::error::ApiError;
use crate::request::HttpRequest;
use crate::state::GatewayState;

/// Forward the request only if it carries a valid token.
///
/// # Errors
///
/// Returns the mapped token error; the inner service is not called.
pub async fn require_token<P>(
    State(state): State<Arc<GatewayState<P>>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    P: UserProvider + 'static,
{
    let response = state
        .middleware
        .handle(HttpRequest::new(request), |request| {
            next.run(request.into_inner())
        })
        .map_err(|err| state.api_error(&err))?;

    Ok(response.await)
}

/// Validate and refresh the request token, then forward the request.
///
/// The refreshed token replaces the request's token header and is returned
/// in the same header on successful responses. The authenticated user, if any, is
/// attached as a request extension.
///
/// # Errors
///
/// Returns the mapped token error; the inner service is not called.
pub async fn guard_refresh<P>(
    State(state): State<Arc<GatewayState<P>>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    P: UserProvider + 'static,
{
    let request = HttpRequest::new(request);
    let mut guard = state.guard_for(&request);

    let refreshed = guard
        .handle(|token| HeaderValue::from_str(&format!("Bearer {token}")))
        .map_err(|err| state.api_error(&err))?
        .map_err(|err| ApiError::Internal(format!("refreshed token is not a header value: {err}")))?;

    let user = guard
        .user()
        .map_err(|err| state.api_error(&err))?
        .cloned();

    let mut request = request.into_inner();
    request
        .headers_mut()
        .insert(state.header_name().clone(), refreshed.clone());
    if let Some(user) = user {
        request.extensions_mut().insert(user);
    }

    let mut response = next.run(request).await;
    if response.status().is_success() {
        response
            .headers_mut()
            .insert(state.header_name().clone(), refreshed);
    }
    Ok(response)
}
