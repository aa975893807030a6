//! Subcommand implementations.

use anyhow::Context;
use chrono::Utc;
use clap::Subcommand;
use serde_json::Value;

use bearer_guard_auth::{Payload, TokenFactory};

/// Token operations.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign a JSON object into a token.
    Encode {
        /// Claims as a JSON object.
        #[arg(long, default_value = "{}")]
        claims: String,

        /// Set `iat` to now and `exp` to now plus this many seconds.
        #[arg(long)]
        ttl: Option<i64>,
    },

    /// Verify a token and print its payload.
    Decode {
        /// The token.
        token: String,

        /// Print only the claim at this key or dot path.
        #[arg(long)]
        path: Option<String>,
    },

    /// Check a token; exits non-zero if it is not valid.
    Validate {
        /// The token.
        token: String,
    },
}

/// Result of a command: what to print, and whether to exit successfully.
#[derive(Debug, PartialEq, Eq)]
pub struct Outcome {
    pub output: String,
    pub success: bool,
}

impl Outcome {
    fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
        }
    }
}

/// Run `command` with tokens from `factory`.
pub fn execute(command: &Command, factory: &TokenFactory) -> anyhow::Result<Outcome> {
    match command {
        Command::Encode { claims, ttl } => {
            let value: Value = serde_json::from_str(claims).context("claims are not valid JSON")?;
            let mut payload = Payload::try_from(value)?;
            if let Some(ttl) = ttl {
                let now = Utc::now().timestamp();
                payload.insert("iat", now);
                payload.insert("exp", now.saturating_add(*ttl));
            }
            tracing::debug!(claims = payload.len(), "Encoding token");

            let token = factory.token().create_token(&payload)?;
            Ok(Outcome::ok(token.into_string()?))
        }
        Command::Decode { token, path } => {
            let token = factory.token_from(token.as_str());
            let value = match path {
                Some(path) => token.query(path)?.unwrap_or(Value::Null),
                None => Value::from(token.payload()?),
            };
            Ok(Outcome::ok(serde_json::to_string_pretty(&value)?))
        }
        Command::Validate { token } => {
            let valid = factory.token_from(token.as_str()).validate()?;
            Ok(Outcome {
                output: if valid { "valid" } else { "invalid" }.to_string(),
                success: valid,
            })
        }
    }
}
