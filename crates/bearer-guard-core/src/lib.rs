//! Core types and utilities for bearer-guard.
//!
//! This crate provides the foundational types shared by the auth and gateway crates:
//!
//! - **Identifiers**: the opaque `UserId` carried in the `user_id` claim
//! - **Credentials**: the key/value map handed to user providers on login
//! - **Error types**: identifier parsing errors
//!
//! # Example
//!
//! ```
//! use bearer_guard_core::UserId;
//! use serde_json::json;
//!
//! let from_number = UserId::from_claim(&json!(42)).unwrap();
//! let from_string = UserId::from_claim(&json!("42")).unwrap();
//! assert_eq!(from_number, from_string);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;

pub use error::{IdError, Result};
pub use ids::{Credentials, UserId};
