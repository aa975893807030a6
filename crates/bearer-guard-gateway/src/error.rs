//! API error types and responses.
//!
//! Every failure leaves the gateway as `{"error": {"code": ..., "message": ...}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use bearer_guard_auth::{ErrorMessages, JwtError};

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The guard rejected the request or the credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// The request carried no token.
    #[error("{message}")]
    MissingToken {
        /// Client-facing message.
        message: String,
        /// Status chosen by deployment policy.
        status: StatusCode,
    },

    /// The token failed verification.
    #[error("{0}")]
    InvalidToken(String),

    /// No signing secret is configured.
    #[error("{0}")]
    MissingSecret(String),

    /// Invalid request body or parameters.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Error details.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Map a token error to its response, using the configured messages.
    #[must_use]
    pub fn from_jwt(
        err: &JwtError,
        messages: &ErrorMessages,
        missing_token_status: StatusCode,
    ) -> Self {
        match err {
            JwtError::NoToken => Self::MissingToken {
                message: messages.no_token.clone(),
                status: missing_token_status,
            },
            JwtError::NoSecret => {
                tracing::error!("No JWT secret configured");
                Self::MissingSecret(messages.no_secret.clone())
            }
            JwtError::Unauthorized => Self::Unauthorized("Unauthorized.".to_string()),
            JwtError::InvalidPayload(msg) => Self::BadRequest(msg.clone()),
            other if other.is_configuration_error() => {
                tracing::error!(error = %other, "Token configuration error");
                Self::Internal(messages.error.clone())
            }
            JwtError::InvalidToken | JwtError::MissingClaim(_) | JwtError::Verification(_) => {
                Self::InvalidToken(messages.invalid_token.clone())
            }
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::MissingToken { status, .. } => *status,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingSecret(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::MissingToken { .. } => "missing_token",
            Self::InvalidToken(_) => "invalid_token",
            Self::MissingSecret(_) => "missing_secret",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bearer_guard_auth::CodecError;

    fn map(err: &JwtError) -> ApiError {
        ApiError::from_jwt(err, &ErrorMessages::default(), StatusCode::UNPROCESSABLE_ENTITY)
    }

    #[test]
    fn error_status_codes() {
        assert_eq!(
            ApiError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InvalidToken("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::MissingSecret("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn missing_token_uses_policy_status() {
        let err = ApiError::from_jwt(
            &JwtError::NoToken,
            &ErrorMessages::default(),
            StatusCode::UNAUTHORIZED,
        );
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "missing_token");

        assert_eq!(
            map(&JwtError::NoToken).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn jwt_errors_use_configured_messages() {
        assert_eq!(map(&JwtError::NoToken).to_string(), "Token is required.");
        assert_eq!(map(&JwtError::InvalidToken).to_string(), "Token is not valid.");
        assert_eq!(map(&JwtError::NoSecret).to_string(), "No JWT secret defined.");
        assert_eq!(
            map(&JwtError::Verification(CodecError::Expired)).to_string(),
            "Token is not valid."
        );
        assert_eq!(
            map(&JwtError::Verification(CodecError::UnsupportedAlgorithm("XX1".into())))
                .to_string(),
            "Something went wrong while validating the token."
        );

        let messages = ErrorMessages {
            invalid_token: "Nope.".to_string(),
            ..ErrorMessages::default()
        };
        let err = ApiError::from_jwt(
            &JwtError::InvalidToken,
            &messages,
            StatusCode::UNPROCESSABLE_ENTITY,
        );
        assert_eq!(err.to_string(), "Nope.");
    }

    #[test]
    fn error_codes() {
        assert_eq!(map(&JwtError::Unauthorized).code(), "unauthorized");
        assert_eq!(map(&JwtError::InvalidToken).code(), "invalid_token");
        assert_eq!(map(&JwtError::MissingClaim("exp")).code(), "invalid_token");
        assert_eq!(map(&JwtError::NoSecret).code(), "missing_secret");
        assert_eq!(
            map(&JwtError::Verification(CodecError::InvalidKey("pem".into()))).code(),
            "internal_error"
        );
        assert_eq!(
            map(&JwtError::InvalidPayload("not an object".into())).code(),
            "bad_request"
        );
    }
}
