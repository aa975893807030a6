//! Gateway configuration types.

use std::time::Duration;

use axum::http::StatusCode;
use serde::Deserialize;

/// Configuration for the gateway service.
///
/// Token settings live in [`JwtConfig`](bearer_guard_auth::JwtConfig); this
/// covers the HTTP server around them.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Allowed CORS origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Status answered when a request carries no token (422 or 401).
    #[serde(default = "GatewayConfig::default_missing_token_status")]
    pub missing_token_status: u16,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    const fn default_max_body() -> usize {
        64 * 1024 // 64 KB
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    const fn default_missing_token_status() -> u16 {
        422
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get the missing-token status.
    ///
    /// Anything other than a 4xx code falls back to 422.
    #[must_use]
    pub fn missing_token_status(&self) -> StatusCode {
        StatusCode::from_u16(self.missing_token_status)
            .ok()
            .filter(StatusCode::is_client_error)
            .unwrap_or(StatusCode::UNPROCESSABLE_ENTITY)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            cors_origins: vec!["*".to_string()],
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
            missing_token_status: Self::default_missing_token_status(),
        }
    }
}
