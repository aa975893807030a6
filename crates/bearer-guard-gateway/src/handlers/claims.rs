//! Token payload inspection.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use bearer_guard_auth::{JwtError, TokenRequest, UserProvider};

use crate::error::ApiError;
use crate::request::HttpRequest;
use crate::state::GatewayState;

/// Query parameter selecting a claim.
const PATH_PARAM: &str = "path";

/// Response for a path query.
#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    /// The requested path.
    pub path: String,
    /// The value at `path`, or `null`.
    pub value: Option<Value>,
}

/// Return the decoded payload, or one claim with `?path=`.
///
/// ```text
/// GET /v1/claims?path=context.some
/// Authorization: Bearer <token>
///
/// Response: 200 OK
/// {"path": "context.some", "value": "data"}
/// ```
///
/// # Errors
///
/// Returns the mapped token error if the token is missing or does not decode.
pub async fn claims<P>(
    State(state): State<Arc<GatewayState<P>>>,
    request: Request,
) -> Result<Json<Value>, ApiError>
where
    P: UserProvider + 'static,
{
    let request = HttpRequest::new(request);
    let raw = state
        .extractor
        .extract(&request)
        .ok_or_else(|| state.api_error(&JwtError::NoToken))?;
    let token = state.tokens.token_from(raw);

    let body = match request.input(PATH_PARAM) {
        Some(path) => {
            let value = token.query(path).map_err(|err| state.api_error(&err))?;
            serde_json::to_value(ClaimResponse {
                path: path.to_string(),
                value,
            })
            .map_err(|err| ApiError::Internal(err.to_string()))?
        }
        None => Value::from(token.payload().map_err(|err| state.api_error(&err))?),
    };

    Ok(Json(body))
}
