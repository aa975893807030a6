//! Token encoding and verification.
//!
//! This module defines the [`Codec`] contract the token layer delegates all
//! cryptographic work to, and [`JwtCodec`], the default implementation over
//! the `jsonwebtoken` crate.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;

use crate::config::JwtConfig;
use crate::error::CodecError;
use crate::payload::Payload;

/// Signs and verifies compact tokens.
pub trait Codec: Send + Sync {
    /// Sign `payload` into a compact token.
    ///
    /// # Errors
    ///
    /// Returns an error if the algorithm is unknown or the secret is not usable as a key.
    fn encode(&self, payload: &Payload, secret: &str, algorithm: &str)
        -> Result<String, CodecError>;

    /// Verify `token` and return its payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, the signature does not
    /// match, or a temporal claim (`exp`, `nbf`) is violated beyond the leeway.
    fn decode(&self, token: &str, secret: &str, algorithm: &str) -> Result<Payload, CodecError>;

    /// Verify `token`, mapping any failure to `false`.
    fn validate(&self, token: &str, secret: &str, algorithm: &str) -> bool {
        self.decode(token, secret, algorithm).is_ok()
    }
}

/// A codec shared between tokens.
pub type SharedCodec = Arc<dyn Codec>;

/// `jsonwebtoken`-backed codec.
///
/// For `HS*` algorithms the secret is the shared HMAC key. For `RS*`, `PS*`,
/// `ES*` and `EdDSA` the secret is PEM key material: the private key when
/// encoding and the public key when decoding.
#[derive(Debug, Clone, Default)]
pub struct JwtCodec {
    leeway_seconds: u64,
}

impl JwtCodec {
    /// Create a codec with the given clock-skew leeway.
    #[must_use]
    pub const fn new(leeway_seconds: u64) -> Self {
        Self { leeway_seconds }
    }

    /// Create a codec using the configured leeway.
    #[must_use]
    pub const fn from_config(config: &JwtConfig) -> Self {
        Self::new(config.leeway_seconds)
    }

    /// The leeway applied to `exp` and `nbf`.
    #[must_use]
    pub const fn leeway_seconds(&self) -> u64 {
        self.leeway_seconds
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        // Claim shape belongs to the caller; only check temporal claims when present
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = self.leeway_seconds;
        validation
    }
}

impl Codec for JwtCodec {
    fn encode(
        &self,
        payload: &Payload,
        secret: &str,
        algorithm: &str,
    ) -> Result<String, CodecError> {
        let algorithm = parse_algorithm(algorithm)?;
        let key = encoding_key(algorithm, secret)?;

        encode(&Header::new(algorithm), payload, &key).map_err(|e| match e.kind() {
            ErrorKind::InvalidKeyFormat | ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidRsaKey(_) => {
                CodecError::InvalidKey(e.to_string())
            }
            _ => CodecError::Encoding(e.to_string()),
        })
    }

    fn decode(&self, token: &str, secret: &str, algorithm: &str) -> Result<Payload, CodecError> {
        let algorithm = parse_algorithm(algorithm)?;
        let key = decoding_key(algorithm, secret)?;

        let data = decode::<Payload>(token, &key, &self.validation(algorithm)).map_err(|e| {
            let err = match e.kind() {
                ErrorKind::ExpiredSignature => CodecError::Expired,
                ErrorKind::ImmatureSignature => CodecError::Immature,
                ErrorKind::InvalidSignature => CodecError::InvalidSignature,
                ErrorKind::InvalidKeyFormat
                | ErrorKind::InvalidEcdsaKey
                | ErrorKind::InvalidRsaKey(_) => CodecError::InvalidKey(e.to_string()),
                _ => CodecError::Malformed(e.to_string()),
            };
            tracing::debug!(error = %err, "Token verification failed");
            err
        })?;

        check_timestamps(&data.claims, self.leeway_seconds).inspect_err(|err| {
            tracing::debug!(error = %err, "Token timestamp check failed");
        })?;

        Ok(data.claims)
    }
}

/// Check `exp`, `nbf` and `iat` against now, allowing `leeway` seconds of skew.
///
/// Absent claims pass. A present claim that is not a non-negative number is malformed.
#[allow(clippy::cast_precision_loss)]
fn check_timestamps(payload: &Payload, leeway: u64) -> Result<(), CodecError> {
    let now = Utc::now().timestamp() as f64;
    let leeway = leeway as f64;

    if let Some(exp) = timestamp_claim(payload, "exp")? {
        if exp < now - leeway {
            return Err(CodecError::Expired);
        }
    }
    if let Some(nbf) = timestamp_claim(payload, "nbf")? {
        if nbf > now + leeway {
            return Err(CodecError::Immature);
        }
    }
    if let Some(iat) = timestamp_claim(payload, "iat")? {
        if iat > now + leeway {
            return Err(CodecError::Immature);
        }
    }
    Ok(())
}

fn timestamp_claim(payload: &Payload, name: &str) -> Result<Option<f64>, CodecError> {
    match payload.get(name) {
        None => Ok(None),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(t) if t >= 0.0 => Ok(Some(t)),
            _ => Err(CodecError::Malformed(format!("{name} is negative"))),
        },
        Some(_) => Err(CodecError::Malformed(format!("{name} is not a number"))),
    }
}

fn parse_algorithm(name: &str) -> Result<Algorithm, CodecError> {
    Algorithm::from_str(name).map_err(|_| CodecError::UnsupportedAlgorithm(name.to_string()))
}

fn encoding_key(algorithm: Algorithm, secret: &str) -> Result<EncodingKey, CodecError> {
    let pem = secret.as_bytes();
    let key = match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            return Ok(EncodingKey::from_secret(pem));
        }
        Algorithm::ES256 | Algorithm::ES384 => EncodingKey::from_ec_pem(pem),
        Algorithm::EdDSA => EncodingKey::from_ed_pem(pem),
        _ => EncodingKey::from_rsa_pem(pem),
    };
    key.map_err(|e| CodecError::InvalidKey(e.to_string()))
}

fn decoding_key(algorithm: Algorithm, secret: &str) -> Result<DecodingKey, CodecError> {
    let pem = secret.as_bytes();
    let key = match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            return Ok(DecodingKey::from_secret(pem));
        }
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem),
        Algorithm::EdDSA => DecodingKey::from_ed_pem(pem),
        _ => DecodingKey::from_rsa_pem(pem),
    };
    key.map_err(|e| CodecError::InvalidKey(e.to_string()))
}

/// A deterministic codec for testing.
///
/// Tokens are opaque strings registered together with the secret and
/// algorithm they are valid for. `encode` registers the token it returns, so
/// tokens created through a [`Token`](crate::Token) decode back to their payload.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Default)]
pub struct MockCodec {
    tokens: parking_lot::Mutex<std::collections::HashMap<String, MockEntry>>,
}

#[cfg(any(test, feature = "test-utils"))]
struct MockEntry {
    secret: String,
    algorithm: String,
    payload: Payload,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockCodec {
    /// Create an empty mock codec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` as valid for `secret`/`algorithm`, returning `self`.
    #[must_use]
    pub fn with_token(
        self,
        token: impl Into<String>,
        secret: impl Into<String>,
        algorithm: impl Into<String>,
        payload: Payload,
    ) -> Self {
        self.insert(token, secret, algorithm, payload);
        self
    }

    /// Register `token` as valid for `secret`/`algorithm`.
    pub fn insert(
        &self,
        token: impl Into<String>,
        secret: impl Into<String>,
        algorithm: impl Into<String>,
        payload: Payload,
    ) {
        self.tokens.lock().insert(
            token.into(),
            MockEntry {
                secret: secret.into(),
                algorithm: algorithm.into(),
                payload,
            },
        );
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Codec for MockCodec {
    fn encode(
        &self,
        payload: &Payload,
        secret: &str,
        algorithm: &str,
    ) -> Result<String, CodecError> {
        use base64::prelude::*;

        let body = serde_json::to_vec(payload).map_err(|e| CodecError::Encoding(e.to_string()))?;
        let token = format!("mock.{algorithm}.{}", BASE64_URL_SAFE_NO_PAD.encode(body));
        self.insert(token.clone(), secret, algorithm, payload.clone());
        Ok(token)
    }

    fn decode(&self, token: &str, secret: &str, algorithm: &str) -> Result<Payload, CodecError> {
        let tokens = self.tokens.lock();
        let entry = tokens
            .get(token)
            .ok_or_else(|| CodecError::Malformed("unknown mock token".to_string()))?;

        if entry.algorithm != algorithm {
            return Err(CodecError::Malformed(format!(
                "token was issued for {}, not {algorithm}",
                entry.algorithm
            )));
        }
        if entry.secret != secret {
            return Err(CodecError::InvalidSignature);
        }
        Ok(entry.payload.clone())
    }
}
