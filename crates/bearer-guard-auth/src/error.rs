//! Token error types.

use thiserror::Error;

/// A result type using `JwtError`.
pub type Result<T> = std::result::Result<T, JwtError>;

/// Errors raised by token, guard and middleware operations.
///
/// A failed signature or claim check is not an error for [`Token::validate`],
/// which answers `false`; it becomes [`JwtError::InvalidToken`] only through
/// [`Token::validate_or_fail`].
///
/// [`Token::validate`]: crate::Token::validate
/// [`Token::validate_or_fail`]: crate::Token::validate_or_fail
#[derive(Debug, Error)]
pub enum JwtError {
    /// No secret was set explicitly or configured.
    #[error("unable to find secret; set JWT_SECRET or set one on the token")]
    NoSecret,

    /// No token was set on the value or found in the request.
    #[error("no token has been set")]
    NoToken,

    /// The token failed signature or claim verification.
    #[error("token is not valid")]
    InvalidToken,

    /// The guard rejected the request.
    #[error("unauthorized")]
    Unauthorized,

    /// A claim the guard depends on is absent or has the wrong type.
    #[error("missing required claim: {0}")]
    MissingClaim(&'static str),

    /// The payload handed to the token layer was not a JSON object.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The codec could not decode or encode the token.
    #[error(transparent)]
    Verification(#[from] CodecError),
}

impl JwtError {
    /// Returns `true` if the error comes from server configuration rather than the request.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::NoSecret
                | Self::Verification(
                    CodecError::UnsupportedAlgorithm(_)
                        | CodecError::InvalidKey(_)
                        | CodecError::Encoding(_)
                )
        )
    }

    /// Returns the HTTP status code for this error.
    ///
    /// A missing token maps to 401 here; deployments that answer 422 apply
    /// that policy at the HTTP boundary.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        if self.is_configuration_error() {
            return 500;
        }
        match self {
            Self::InvalidPayload(_) => 400,
            _ => 401,
        }
    }
}

/// Errors raised by a [`Codec`](crate::Codec).
///
/// Every decode failure (bad structure, bad signature, violated temporal
/// claims) is one of these variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The algorithm name is not one the codec supports.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The secret is not usable as key material for the algorithm.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// The `exp` claim lies in the past, beyond the leeway.
    #[error("token expired")]
    Expired,

    /// The `nbf` claim lies in the future, beyond the leeway.
    #[error("token not yet valid")]
    Immature,

    /// The signature does not match the header and payload.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token is not a well-formed compact JWT.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The payload could not be signed.
    #[error("encoding failed: {0}")]
    Encoding(String),
}
