//! Identifier errors for bearer-guard.

use thiserror::Error;

/// A result type using `IdError`.
pub type Result<T> = std::result::Result<T, IdError>;

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The identifier was empty.
    #[error("identifier is empty")]
    Empty,

    /// The claim held a JSON type that cannot name a user.
    #[error("unsupported user_id claim type: {0}")]
    UnsupportedClaim(&'static str),
}
